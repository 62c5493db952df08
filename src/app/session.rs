use crate::core::runner::{BackgroundRunner, Completion, InFlightGuard, JobTicket};
use crate::domain::model::{FieldKey, InvoiceFields, InvoiceRequest, LineItem};
use crate::domain::ports::DocumentCompiler;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::format::format_currency;
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::fmt::Write as _;

pub const HELP_TEXT: &str = "\
Commands:
  show                                   print the invoice form
  set <field> <value...>                 set a field, e.g. `set billToName Acme Ltd`
  notes <text...>                        set the notes printed on the invoice
  item <name> | <desc> | <qty> | <price> | <tax>
                                         add a line item (tax is optional)
  remove <n>                             remove item n
  clear                                  reset the form
  generate [force]                       build the PDF in the background
  status                                 is an invoice being generated?
  help                                   this text
  quit | exit                            leave (waits for a running invoice)";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Help,
    Show,
    Set(FieldKey, String),
    Notes(String),
    Item(LineItem),
    Remove(usize),
    Clear,
    Generate { force: bool },
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Started(JobTicket),
    Quit,
}

/// Parses one shell line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => SessionCommand::Help,
        "show" => SessionCommand::Show,
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err(ToolkitError::validation("usage: set <field> <value...>"));
            }
            SessionCommand::Set(field.parse()?, value.to_string())
        }
        "notes" => SessionCommand::Notes(rest.to_string()),
        "item" => SessionCommand::Item(parse_item_spec(rest)?),
        "remove" => {
            let index = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ToolkitError::validation("usage: remove <n> (n starts at 1)"))?;
            SessionCommand::Remove(index)
        }
        "clear" => SessionCommand::Clear,
        "generate" => match rest {
            "" => SessionCommand::Generate { force: false },
            "force" => SessionCommand::Generate { force: true },
            other => {
                return Err(ToolkitError::validation(format!(
                    "unknown generate option '{}'",
                    other
                )))
            }
        },
        "status" => SessionCommand::Status,
        "quit" | "exit" => SessionCommand::Quit,
        other => {
            return Err(ToolkitError::validation(format!(
                "unknown command '{}', type `help`",
                other
            )))
        }
    };
    Ok(Some(command))
}

/// `name|description|quantity|price|tax`, tax optional.
pub fn parse_item_spec(spec: &str) -> Result<LineItem> {
    let parts: Vec<&str> = spec.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [name, description, quantity, price] => {
            LineItem::parse(name, description, quantity, price, "")
        }
        [name, description, quantity, price, tax] => {
            LineItem::parse(name, description, quantity, price, tax)
        }
        _ => Err(ToolkitError::validation(
            "an item is name|description|quantity|price|tax",
        )),
    }
}

/// Fills an empty invoice number (`%Y%m%d-%H%M`) and date (`%d/%m/%Y`) from `now`.
pub fn fill_dates(fields: &mut InvoiceFields, now: DateTime<Local>) {
    if fields.invoice_number.is_empty() {
        fields.invoice_number = now.format("%Y%m%d-%H%M").to_string();
    }
    if fields.invoice_date.is_empty() {
        fields.invoice_date = now.format("%d/%m/%Y").to_string();
    }
}

/// Defaults for requests built outside the form (files, flags, batch rows): trims values,
/// fills dates and, when blank, the total from the items.
pub fn complete_request(request: &mut InvoiceRequest, currency: &str, now: DateTime<Local>) {
    request.fields = request.fields.trimmed();
    fill_dates(&mut request.fields, now);
    if request.fields.total_amount.is_empty() && !request.items.is_empty() {
        let total = format_currency(currency, request.items_total(currency));
        request.fields.set(FieldKey::TotalAmount, total);
    }
}

/// Form state of the interactive shell plus the machinery to generate in the background.
pub struct InvoiceSession<C: DocumentCompiler + 'static> {
    fields: InvoiceFields,
    items: Vec<LineItem>,
    guard: InFlightGuard,
    runner: BackgroundRunner<C>,
    currency: String,
}

impl<C: DocumentCompiler + 'static> InvoiceSession<C> {
    pub fn new(runner: BackgroundRunner<C>, currency: impl Into<String>) -> Self {
        Self {
            fields: InvoiceFields::default(),
            items: Vec::new(),
            guard: InFlightGuard::new(),
            runner,
            currency: currency.into(),
        }
    }

    pub fn fields(&self) -> &InvoiceFields {
        &self.fields
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn execute(&mut self, command: SessionCommand) -> Result<Reply> {
        let reply = match command {
            SessionCommand::Help => Reply::Text(HELP_TEXT.to_string()),
            SessionCommand::Show => Reply::Text(self.render_form()),
            SessionCommand::Set(key, value) => {
                self.fields.set(key, value);
                Reply::Text(format!("{} updated", key.label()))
            }
            SessionCommand::Notes(text) => {
                self.fields.set(FieldKey::NotesText, text);
                Reply::Text("Notes saved".to_string())
            }
            SessionCommand::Item(item) => {
                let text = format!("Added {} ({}{})", item.name, self.currency, item.amount);
                self.items.push(item);
                self.refresh_total();
                Reply::Text(text)
            }
            SessionCommand::Remove(index) => {
                if index == 0 || index > self.items.len() {
                    return Err(ToolkitError::validation(format!(
                        "there is no item {} (the form has {})",
                        index,
                        self.items.len()
                    )));
                }
                let removed = self.items.remove(index - 1);
                self.refresh_total();
                Reply::Text(format!("Removed {}", removed.name))
            }
            SessionCommand::Clear => {
                self.fields = InvoiceFields::default();
                self.items.clear();
                Reply::Text("Form cleared".to_string())
            }
            SessionCommand::Generate { force } => Reply::Started(self.generate(force)?),
            SessionCommand::Status => Reply::Text(match self.guard.current() {
                Some(ticket) => format!("Invoice {} is being generated", ticket),
                None => "Idle".to_string(),
            }),
            SessionCommand::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    /// Snapshots the form and hands it to a worker. Rejected while another run is in flight.
    pub fn generate(&mut self, force: bool) -> Result<JobTicket> {
        if self.items.is_empty() && !force {
            return Err(ToolkitError::validation(
                "No items added. Use `generate force` to create an invoice without items.",
            ));
        }
        let ticket = self.guard.try_acquire()?;
        let request = self.snapshot_request(Local::now());

        if let Err(e) = self.runner.spawn(ticket, request) {
            self.guard.release(ticket);
            return Err(e);
        }
        Ok(ticket)
    }

    /// The request a generation started at `now` would use.
    pub fn snapshot_request(&self, now: DateTime<Local>) -> InvoiceRequest {
        let mut request = InvoiceRequest::new(self.fields.trimmed(), self.items.clone());
        fill_dates(&mut request.fields, now);
        let total = format_currency(&self.currency, request.items_total(&self.currency));
        request.fields.set(FieldKey::TotalAmount, total);
        request
    }

    /// Runs on the interactive loop; the only place a worker's result reaches the form.
    pub fn apply_completion(&mut self, completion: Completion) -> String {
        if !self.guard.release(completion.ticket) {
            return format!("Ignored result of stale job {}", completion.ticket);
        }
        match completion.result {
            Ok(outcome) if outcome.warnings => format!(
                "Invoice generated with warnings: {}",
                outcome.artifact_path.display()
            ),
            Ok(outcome) => format!("Invoice generated: {}", outcome.artifact_path.display()),
            Err(message) => format!("Invoice generation failed: {}", message),
        }
    }

    fn refresh_total(&mut self) {
        let total: Decimal = self
            .items
            .iter()
            .filter_map(|item| item.amount_value(&self.currency))
            .sum();
        self.fields
            .set(FieldKey::TotalAmount, format_currency(&self.currency, total));
    }

    fn render_form(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.fields.iter() {
            let _ = writeln!(out, "{:<18} {}", format!("{}:", key.macro_name()), value);
        }
        if self.items.is_empty() {
            out.push_str("No items added");
        } else {
            for (i, item) in self.items.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>2}. {} | {} | {} x {}{} | tax {}% | {}{}",
                    i + 1,
                    item.name,
                    item.description,
                    item.quantity,
                    self.currency,
                    item.price,
                    item.tax,
                    self.currency,
                    item.amount
                );
            }
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::InvoiceLedger;
    use crate::core::pipeline::InvoicePipeline;
    use crate::domain::model::CompiledArtifact;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct WritingCompiler;

    #[async_trait]
    impl DocumentCompiler for WritingCompiler {
        async fn compile(&self, source: &Path) -> Result<CompiledArtifact> {
            let path = self.artifact_path(source);
            std::fs::write(&path, b"%PDF")?;
            Ok(CompiledArtifact {
                path,
                exit_code: Some(0),
                warnings: false,
            })
        }
    }

    fn session(
        dir: &TempDir,
    ) -> (
        InvoiceSession<WritingCompiler>,
        tokio::sync::mpsc::UnboundedReceiver<Completion>,
    ) {
        let template = dir.path().join("invoiceTemplate.tex");
        std::fs::write(&template, "\\newcommand{\\invoiceNumber}{0}\n%%ITEM_ROWS%%\n").unwrap();
        let pipeline = InvoicePipeline::new(
            template,
            dir.path(),
            InvoiceLedger::new(dir.path().join("invoiceHistory.csv")),
            WritingCompiler,
            "₹",
        );
        let (runner, receiver) = BackgroundRunner::new(Arc::new(pipeline));
        (InvoiceSession::new(runner, "₹"), receiver)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(
            parse_command("set billToName Acme Pvt Ltd").unwrap(),
            Some(SessionCommand::Set(FieldKey::BillToName, "Acme Pvt Ltd".to_string()))
        );
        assert_eq!(
            parse_command("generate force").unwrap(),
            Some(SessionCommand::Generate { force: true })
        );
        assert_eq!(parse_command("EXIT").unwrap(), Some(SessionCommand::Quit));
        assert!(parse_command("set nope value").is_err());
        assert!(parse_command("remove 0").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_parse_item_spec() {
        let item = parse_item_spec("Design | Logo work | 2 | 1,500 | 18%").unwrap();
        assert_eq!(item.name, "Design");
        assert_eq!(item.tax, "18");
        assert_eq!(item.amount, "3540.00");

        let item = parse_item_spec("Hosting||1|99").unwrap();
        assert_eq!(item.tax, "0");
        assert!(parse_item_spec("Hosting|1").is_err());
        assert!(parse_item_spec("|desc|1|2|3").is_err());
    }

    #[tokio::test]
    async fn test_items_update_total() {
        let dir = TempDir::new().unwrap();
        let (mut session, _receiver) = session(&dir);

        for line in ["item A||2|500|0", "item B||1|234.5|0"] {
            let command = parse_command(line).unwrap().unwrap();
            session.execute(command).unwrap();
        }
        assert_eq!(session.fields().total_amount, "₹1,234.50");

        session.execute(SessionCommand::Remove(1)).unwrap();
        assert_eq!(session.items().len(), 1);
        assert_eq!(session.fields().total_amount, "₹234.50");
        assert!(session.execute(SessionCommand::Remove(5)).is_err());
    }

    #[tokio::test]
    async fn test_total_sums_rounded_item_amounts() {
        let dir = TempDir::new().unwrap();
        let (mut session, _receiver) = session(&dir);

        for line in ["item A||1|0.1|", "item B||1|0.2|", "item C||1|2.675|"] {
            let command = parse_command(line).unwrap().unwrap();
            session.execute(command).unwrap();
        }
        assert_eq!(session.items()[2].amount, "2.68");
        assert_eq!(session.fields().total_amount, "₹2.98");
    }

    #[tokio::test]
    async fn test_snapshot_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let (mut session, _receiver) = session(&dir);
        session
            .execute(SessionCommand::Set(FieldKey::BillToName, "  Acme ".to_string()))
            .unwrap();
        session
            .execute(SessionCommand::Item(parse_item_spec("A||1|100|").unwrap()))
            .unwrap();

        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();
        let request = session.snapshot_request(now);
        assert_eq!(request.fields.invoice_number, "20240305-0907");
        assert_eq!(request.fields.invoice_date, "05/03/2024");
        assert_eq!(request.fields.bill_to_name, "Acme");
        assert_eq!(request.fields.total_amount, "₹100.00");
        // The form itself is untouched.
        assert_eq!(session.fields().invoice_number, "");
    }

    #[test]
    fn test_complete_request_keeps_given_total() {
        let now = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let item = parse_item_spec("A||3|10|").unwrap();

        let mut request = InvoiceRequest::new(InvoiceFields::default(), vec![item.clone()]);
        complete_request(&mut request, "$", now);
        assert_eq!(request.fields.invoice_number, "20241231-2359");
        assert_eq!(request.fields.total_amount, "$30.00");

        let fields = InvoiceFields::default()
            .with(FieldKey::InvoiceNumber, " INV-3 ")
            .with(FieldKey::TotalAmount, "100");
        let mut request = InvoiceRequest::new(fields, vec![item]);
        complete_request(&mut request, "$", now);
        assert_eq!(request.fields.invoice_number, "INV-3");
        assert_eq!(request.fields.total_amount, "100");

        let mut request = InvoiceRequest::default();
        complete_request(&mut request, "$", now);
        assert_eq!(request.fields.total_amount, "");
    }

    #[tokio::test]
    async fn test_generate_requires_items_unless_forced() {
        let dir = TempDir::new().unwrap();
        let (mut session, mut receiver) = session(&dir);

        assert!(matches!(
            session.generate(false),
            Err(ToolkitError::ValidationError { .. })
        ));
        assert!(!session.is_busy());

        session
            .execute(SessionCommand::Set(FieldKey::InvoiceNumber, "INV-9".to_string()))
            .unwrap();
        let ticket = session.generate(true).unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.generate(true), Err(ToolkitError::Busy)));

        let completion = receiver.recv().await.unwrap();
        assert_eq!(completion.ticket, ticket);
        let message = session.apply_completion(completion);
        assert!(message.starts_with("Invoice generated: "), "{}", message);
        assert!(message.ends_with("invoice_INV-9.pdf"));
        assert!(!session.is_busy());
    }
}
