use crate::utils::error::{Result, ToolkitError};
use crate::utils::format::{parse_display_amount, round_money};
use crate::utils::validation::{parse_number, validate_required};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Placeholder names understood by the invoice template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    CompanyName,
    CompanyAddress,
    CompanyCity,
    CompanyCountry,
    CompanyPostal,
    BillToName,
    BillToAddress,
    BillToCity,
    BillToCountry,
    BillToPostal,
    InvoiceNumber,
    InvoiceDate,
    InvoiceDueDate,
    NotesText,
    TotalAmount,
}

impl FieldKey {
    pub const ALL: [FieldKey; 15] = [
        FieldKey::CompanyName,
        FieldKey::CompanyAddress,
        FieldKey::CompanyCity,
        FieldKey::CompanyCountry,
        FieldKey::CompanyPostal,
        FieldKey::BillToName,
        FieldKey::BillToAddress,
        FieldKey::BillToCity,
        FieldKey::BillToCountry,
        FieldKey::BillToPostal,
        FieldKey::InvoiceNumber,
        FieldKey::InvoiceDate,
        FieldKey::InvoiceDueDate,
        FieldKey::NotesText,
        FieldKey::TotalAmount,
    ];

    /// Name of the `\newcommand` macro in the template.
    pub fn macro_name(self) -> &'static str {
        match self {
            FieldKey::CompanyName => "companyName",
            FieldKey::CompanyAddress => "companyAddress",
            FieldKey::CompanyCity => "companyCity",
            FieldKey::CompanyCountry => "companyCountry",
            FieldKey::CompanyPostal => "companyPostal",
            FieldKey::BillToName => "billToName",
            FieldKey::BillToAddress => "billToAddress",
            FieldKey::BillToCity => "billToCity",
            FieldKey::BillToCountry => "billToCountry",
            FieldKey::BillToPostal => "billToPostal",
            FieldKey::InvoiceNumber => "invoiceNumber",
            FieldKey::InvoiceDate => "invoiceDate",
            FieldKey::InvoiceDueDate => "invoiceDueDate",
            FieldKey::NotesText => "notesText",
            FieldKey::TotalAmount => "totalAmount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKey::CompanyName => "Company Name",
            FieldKey::CompanyAddress => "Company Address",
            FieldKey::CompanyCity => "Company City",
            FieldKey::CompanyCountry => "Company Country",
            FieldKey::CompanyPostal => "Company Postal",
            FieldKey::BillToName => "Bill To Name",
            FieldKey::BillToAddress => "Bill To Address",
            FieldKey::BillToCity => "Bill To City",
            FieldKey::BillToCountry => "Bill To Country",
            FieldKey::BillToPostal => "Bill To Postal",
            FieldKey::InvoiceNumber => "Invoice Number",
            FieldKey::InvoiceDate => "Invoice Date",
            FieldKey::InvoiceDueDate => "Invoice Due Date",
            FieldKey::NotesText => "Notes",
            FieldKey::TotalAmount => "Total Amount",
        }
    }

    pub fn from_macro_name(name: &str) -> Option<FieldKey> {
        FieldKey::ALL.into_iter().find(|key| key.macro_name() == name)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.macro_name())
    }
}

impl FromStr for FieldKey {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        FieldKey::from_macro_name(s.trim()).ok_or_else(|| {
            let known: Vec<&str> = FieldKey::ALL.iter().map(|k| k.macro_name()).collect();
            ToolkitError::validation(format!(
                "Unknown field '{}'. Known fields: {}",
                s.trim(),
                known.join(", ")
            ))
        })
    }
}

/// Values for every template placeholder. Unset values read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceFields {
    pub company_name: String,
    pub company_address: String,
    pub company_city: String,
    pub company_country: String,
    pub company_postal: String,
    pub bill_to_name: String,
    pub bill_to_address: String,
    pub bill_to_city: String,
    pub bill_to_country: String,
    pub bill_to_postal: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub invoice_due_date: String,
    pub notes_text: String,
    pub total_amount: String,
}

impl InvoiceFields {
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::CompanyName => &self.company_name,
            FieldKey::CompanyAddress => &self.company_address,
            FieldKey::CompanyCity => &self.company_city,
            FieldKey::CompanyCountry => &self.company_country,
            FieldKey::CompanyPostal => &self.company_postal,
            FieldKey::BillToName => &self.bill_to_name,
            FieldKey::BillToAddress => &self.bill_to_address,
            FieldKey::BillToCity => &self.bill_to_city,
            FieldKey::BillToCountry => &self.bill_to_country,
            FieldKey::BillToPostal => &self.bill_to_postal,
            FieldKey::InvoiceNumber => &self.invoice_number,
            FieldKey::InvoiceDate => &self.invoice_date,
            FieldKey::InvoiceDueDate => &self.invoice_due_date,
            FieldKey::NotesText => &self.notes_text,
            FieldKey::TotalAmount => &self.total_amount,
        }
    }

    fn slot(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::CompanyName => &mut self.company_name,
            FieldKey::CompanyAddress => &mut self.company_address,
            FieldKey::CompanyCity => &mut self.company_city,
            FieldKey::CompanyCountry => &mut self.company_country,
            FieldKey::CompanyPostal => &mut self.company_postal,
            FieldKey::BillToName => &mut self.bill_to_name,
            FieldKey::BillToAddress => &mut self.bill_to_address,
            FieldKey::BillToCity => &mut self.bill_to_city,
            FieldKey::BillToCountry => &mut self.bill_to_country,
            FieldKey::BillToPostal => &mut self.bill_to_postal,
            FieldKey::InvoiceNumber => &mut self.invoice_number,
            FieldKey::InvoiceDate => &mut self.invoice_date,
            FieldKey::InvoiceDueDate => &mut self.invoice_due_date,
            FieldKey::NotesText => &mut self.notes_text,
            FieldKey::TotalAmount => &mut self.total_amount,
        }
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        *self.slot(key) = value.into();
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Copy with every value trimmed.
    pub fn trimmed(&self) -> Self {
        let mut out = self.clone();
        for key in FieldKey::ALL {
            let value = out.get(key).trim().to_string();
            out.set(key, value);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        FieldKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}

/// One row of the invoice item table. All values are display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(rename = "itemName", alias = "name")]
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub price: String,
    pub tax: String,
    pub amount: String,
}

/// `quantity × price × (1 + tax/100)`, rounded to cents. `None` on overflow.
pub fn compute_amount(quantity: Decimal, price: Decimal, tax_percent: Decimal) -> Option<Decimal> {
    let rate = Decimal::ONE.checked_add(tax_percent.checked_div(Decimal::ONE_HUNDRED)?)?;
    let amount = quantity.checked_mul(price)?.checked_mul(rate)?;
    Some(round_money(amount))
}

impl LineItem {
    /// Validates user input and computes the amount.
    pub fn parse(
        name: &str,
        description: &str,
        quantity: &str,
        price: &str,
        tax: &str,
    ) -> Result<Self> {
        validate_required("Item name", name)?;
        if quantity.trim().is_empty() || price.trim().is_empty() {
            return Err(ToolkitError::validation("Quantity and Price are required."));
        }

        let qty = parse_number("Quantity", quantity)?;
        let unit_price = parse_number("Price", price)?;
        let tax = tax.trim().trim_end_matches('%').trim();
        let tax_percent = if tax.is_empty() {
            Decimal::ZERO
        } else {
            parse_number("Tax", tax)?
        };
        let amount = compute_amount(qty, unit_price, tax_percent)
            .ok_or_else(|| ToolkitError::validation("Amount is too large."))?;

        Ok(Self {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            quantity: quantity.trim().to_string(),
            price: price.trim().to_string(),
            tax: if tax.is_empty() { "0".to_string() } else { tax.to_string() },
            amount: format!("{:.2}", amount),
        })
    }

    /// Fills in a missing amount from quantity, price and tax.
    pub fn normalized(self) -> Result<Self> {
        if !self.amount.trim().is_empty() {
            return Ok(self);
        }
        let normalized = LineItem::parse(
            &self.name,
            &self.description,
            &self.quantity,
            &self.price,
            &self.tax,
        )?;
        Ok(normalized)
    }

    pub fn amount_value(&self, currency_symbol: &str) -> Option<Decimal> {
        parse_display_amount(&self.amount, currency_symbol)
    }
}

/// Everything needed to produce one invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceRequest {
    pub fields: InvoiceFields,
    pub items: Vec<LineItem>,
}

impl InvoiceRequest {
    pub fn new(fields: InvoiceFields, items: Vec<LineItem>) -> Self {
        Self { fields, items }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let request: InvoiceRequest =
            toml::from_str(content).map_err(|e| ToolkitError::ConfigValidationError {
                field: "invoice_request".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        let items = request
            .items
            .into_iter()
            .map(LineItem::normalized)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fields: request.fields,
            items,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Sum of item amounts; amounts that do not parse are skipped.
    pub fn items_total(&self, currency_symbol: &str) -> Decimal {
        self.items
            .iter()
            .filter_map(|item| item.amount_value(currency_symbol))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub invoice_id: String,
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub path: PathBuf,
    pub exit_code: Option<i32>,
    /// The toolchain exited non-zero but still produced the artifact.
    pub warnings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceOutcome {
    pub source_path: PathBuf,
    pub artifact_path: PathBuf,
    pub warnings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub invoice_number: String,
    pub invoice_date: String,
    pub bill_to_name: String,
    pub total_amount: String,
    pub file_path: String,
}

impl LedgerEntry {
    pub const HEADER: [&'static str; 5] = [
        "invoiceNumber",
        "invoiceDate",
        "billToName",
        "totalAmount",
        "filePath",
    ];

    pub fn for_invoice(fields: &InvoiceFields, artifact_path: &Path) -> Self {
        Self {
            invoice_number: fields.invoice_number.clone(),
            invoice_date: fields.invoice_date.clone(),
            bill_to_name: fields.bill_to_name.clone(),
            total_amount: fields.total_amount.clone(),
            file_path: artifact_path.display().to_string(),
        }
    }

    pub fn to_record(&self) -> [&str; 5] {
        [
            &self.invoice_number,
            &self.invoice_date,
            &self.bill_to_name,
            &self.total_amount,
            &self.file_path,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub timestamp: String,
    /// Positive for money in, negative for money out.
    pub amount: Decimal,
    pub category: String,
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_field_key_round_trips_macro_name() {
        for key in FieldKey::ALL {
            assert_eq!(key.macro_name().parse::<FieldKey>().unwrap(), key);
        }
        assert!("billtoname".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_fields_default_to_empty() {
        let fields = InvoiceFields::default().with(FieldKey::BillToName, "Acme");
        assert_eq!(fields.get(FieldKey::BillToName), "Acme");
        assert_eq!(fields.get(FieldKey::InvoiceDate), "");
        assert_eq!(fields.iter().count(), 15);
    }

    #[test]
    fn test_line_item_parse_computes_amount() {
        let item = LineItem::parse("Widget", "Blue", "2", "10", "18").unwrap();
        assert_eq!(item.amount, "23.60");
        assert_eq!(item.tax, "18");

        let untaxed = LineItem::parse("Widget", "", "3", "150", "").unwrap();
        assert_eq!(untaxed.amount, "450.00");
        assert_eq!(untaxed.tax, "0");
    }

    #[test]
    fn test_line_item_amount_rounds_half_cent_up() {
        assert_eq!(LineItem::parse("X", "", "1", "2.675", "0").unwrap().amount, "2.68");
        assert_eq!(LineItem::parse("X", "", "3", "1.115", "0").unwrap().amount, "3.35");
        // 0.1 + 0.2 style inputs stay exact.
        assert_eq!(LineItem::parse("X", "", "3", "0.1", "").unwrap().amount, "0.30");
        assert_eq!(LineItem::parse("X", "", "1", "10.05", "5").unwrap().amount, "10.55");
    }

    #[test]
    fn test_line_item_overflow_is_rejected() {
        let huge = "79228162514264337593543950335";
        assert!(LineItem::parse("X", "", huge, huge, "0").is_err());
    }

    #[test]
    fn test_line_item_parse_validation() {
        assert!(LineItem::parse("", "", "1", "1", "0").is_err());
        assert!(LineItem::parse("Widget", "", "", "1", "0").is_err());
        assert!(LineItem::parse("Widget", "", "two", "1", "0").is_err());
        assert!(LineItem::parse("Widget", "", "1", "1", "x").is_err());
    }

    #[test]
    fn test_request_from_toml_normalizes_items() {
        let content = r#"
[fields]
invoiceNumber = "INV-7"
billToName = "Acme"

[[items]]
itemName = "Widget"
quantity = "2"
price = "10"
tax = "5"

[[items]]
name = "Setup"
quantity = "1"
price = "99"
amount = "99.00"
"#;
        let request = InvoiceRequest::from_toml_str(content).unwrap();
        assert_eq!(request.fields.invoice_number, "INV-7");
        assert_eq!(request.fields.company_name, "");
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].amount, "21.00");
        assert_eq!(request.items[1].name, "Setup");
        assert_eq!(request.items_total("₹"), dec!(120));
    }

    #[test]
    fn test_ledger_entry_uses_fields() {
        let fields = InvoiceFields::default()
            .with(FieldKey::InvoiceNumber, "INV-1")
            .with(FieldKey::BillToName, "Acme")
            .with(FieldKey::TotalAmount, "100");
        let entry = LedgerEntry::for_invoice(&fields, Path::new("/tmp/invoice_INV-1.pdf"));
        assert_eq!(
            entry.to_record(),
            ["INV-1", "", "Acme", "100", "/tmp/invoice_INV-1.pdf"]
        );
    }
}
