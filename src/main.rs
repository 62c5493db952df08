use clap::Parser;
use solo_toolkit::app::batch::run_batch;
use solo_toolkit::app::session::{complete_request, parse_item_spec, InvoiceSession};
use solo_toolkit::app::shell::run_shell;
use solo_toolkit::config::cli::{Command, InvoiceArgs, LogFormat, MoneyCommand};
use solo_toolkit::config::toml_config::DEFAULT_CONFIG_FILE;
use solo_toolkit::core::batch::read_batch;
use solo_toolkit::core::finance::{calculate_productivity, calculate_tax};
use solo_toolkit::core::ledger::InvoiceLedger;
use solo_toolkit::core::money_flow::CashFlowLog;
use solo_toolkit::core::runner::BackgroundRunner;
use solo_toolkit::core::tips::pro_tip;
use solo_toolkit::domain::category::{Category, CategoryGroup};
use solo_toolkit::domain::model::{FieldKey, InvoiceRequest};
use solo_toolkit::domain::ports::ConfigProvider;
use solo_toolkit::utils::error::{ErrorSeverity, Result, ToolkitError};
use solo_toolkit::utils::format::format_currency;
use solo_toolkit::utils::{logger, validation::Validate};
use solo_toolkit::{CliConfig, InvoicePipeline, LatexCompiler, TomlConfig};
use std::path::Path;
use std::sync::Arc;

const STARTER_TEMPLATE: &str = include_str!("../templates/invoiceTemplate.tex");

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> Result<()> {
    if let Command::Init { force } = cli.command {
        return init(&cli.base_dir, force);
    }

    let config = cli.load_config()?;
    config.validate()?;
    tracing::debug!("Configuration: {:?}", config);

    match &cli.command {
        Command::Init { .. } => Ok(()),
        Command::Invoice(args) => invoice(&config, args).await,
        Command::Batch { input } => batch(&config, input).await,
        Command::History => history(&config),
        Command::Tax(args) => {
            let report = calculate_tax(args.income, args.investment, args.health_insurance);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let currency = config.currency_symbol();
                println!("Total deductions: {}", format_currency(currency, report.total_deductions));
                println!("Taxable income:   {}", format_currency(currency, report.taxable_income));
                println!("Tax payable:      {}", format_currency(currency, report.tax));
                println!("{}", report.rebate_text);
            }
            Ok(())
        }
        Command::Productivity(args) => {
            let report = calculate_productivity(args.hours, args.profit)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let currency = config.currency_symbol();
                println!("Daily earnings:  {}", format_currency(currency, report.daily_rate));
                println!("Hourly earnings: {}", format_currency(currency, report.hourly_rate));
                println!(
                    "Productivity:    {:.2}% ({} the benchmark)",
                    report.productivity,
                    report.comparison.as_str()
                );
            }
            Ok(())
        }
        Command::Money { action } => money(&config, action),
        Command::Tip => {
            println!("💡 {}", pro_tip());
            Ok(())
        }
        Command::Shell => {
            let compiler = LatexCompiler::from_config(&config);
            let pipeline = Arc::new(InvoicePipeline::from_config(&config, compiler));
            let (runner, completions) = BackgroundRunner::new(pipeline);
            let session = InvoiceSession::new(runner, config.currency_symbol());
            run_shell(session, completions).await
        }
    }
}

fn init(base_dir: &Path, force: bool) -> Result<()> {
    std::fs::create_dir_all(base_dir)?;
    let defaults = TomlConfig::default();
    let files = [
        (base_dir.join(DEFAULT_CONFIG_FILE), defaults.to_toml_string()?),
        (base_dir.join(&defaults.paths.template), STARTER_TEMPLATE.to_string()),
    ];

    for (path, content) in files {
        if path.exists() && !force {
            println!("⏭️  {} already exists (use --force to overwrite)", path.display());
            continue;
        }
        std::fs::write(&path, content)?;
        tracing::info!("Wrote {}", path.display());
        println!("✅ Wrote {}", path.display());
    }
    Ok(())
}

fn build_request(args: &InvoiceArgs, currency: &str) -> Result<InvoiceRequest> {
    let mut request = match &args.request {
        Some(path) => InvoiceRequest::from_file(path)?,
        None => InvoiceRequest::default(),
    };

    for pair in &args.set {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            ToolkitError::validation(format!("expected KEY=VALUE, got '{}'", pair))
        })?;
        request.fields.set(key.trim().parse::<FieldKey>()?, value.trim());
    }
    for spec in &args.items {
        request.items.push(parse_item_spec(spec)?);
    }

    complete_request(&mut request, currency, chrono::Local::now());
    Ok(request)
}

async fn invoice(config: &TomlConfig, args: &InvoiceArgs) -> Result<()> {
    let request = build_request(args, config.currency_symbol())?;
    let pipeline = InvoicePipeline::from_config(config, LatexCompiler::from_config(config));

    let outcome = pipeline.run(&request).await?;
    if outcome.warnings {
        println!("⚠️  Compiler reported warnings, the PDF was still produced");
    }
    println!("✅ Invoice generated successfully!");
    println!("📁 PDF saved to: {}", outcome.artifact_path.display());
    Ok(())
}

async fn batch(config: &TomlConfig, input: &Path) -> Result<()> {
    let rows = read_batch(input)?;
    let pipeline = InvoicePipeline::from_config(config, LatexCompiler::from_config(config));
    let results = run_batch(&pipeline, rows, config.currency_symbol(), chrono::Local::now()).await;

    let total = results.len();
    let mut failed = 0;
    for result in &results {
        match &result.outcome {
            Ok(outcome) => println!(
                "✅ row {}: {} → {}",
                result.row,
                result.invoice_number.as_deref().unwrap_or_default(),
                outcome.artifact_path.display()
            ),
            Err(e) => {
                failed += 1;
                println!("❌ row {}: {}", result.row, e.user_friendly_message());
            }
        }
    }

    println!("Processed {} invoice(s), {} failed", total, failed);
    if failed > 0 {
        return Err(ToolkitError::BatchIncomplete { failed, total });
    }
    Ok(())
}

fn history(config: &TomlConfig) -> Result<()> {
    let entries = InvoiceLedger::new(config.ledger_path()).entries()?;
    if entries.is_empty() {
        println!("No invoices recorded yet.");
        return Ok(());
    }

    println!(
        "{:<16} {:<12} {:<24} {:>14}  {}",
        "Invoice", "Date", "Bill To", "Total", "File"
    );
    for entry in entries {
        println!(
            "{:<16} {:<12} {:<24} {:>14}  {}",
            entry.invoice_number,
            entry.invoice_date,
            entry.bill_to_name,
            entry.total_amount,
            entry.file_path
        );
    }
    Ok(())
}

fn money(config: &TomlConfig, action: &MoneyCommand) -> Result<()> {
    let log = CashFlowLog::new(config.money_flow_path());
    let currency = config.currency_symbol();

    match action {
        MoneyCommand::Record {
            amount,
            category,
            note,
        } => {
            let category: Category = category.parse()?;
            let entry = log.record(*amount, category, note)?;
            println!(
                "✅ Logged {} under {} at {}",
                format_currency(currency, entry.amount),
                entry.category,
                entry.timestamp
            );
        }
        MoneyCommand::Categories => {
            for (i, category) in Category::ALL.iter().enumerate() {
                println!(
                    "{:>2}. {:<28} {}",
                    i + 1,
                    category.label(),
                    category.group().label()
                );
            }
        }
        MoneyCommand::Summary => {
            let summary = log.summary()?;
            if summary.entries == 0 {
                println!("No cash-flow entries in {}", log.path().display());
                return Ok(());
            }
            for group in [
                CategoryGroup::Inflow,
                CategoryGroup::Needs,
                CategoryGroup::Wants,
                CategoryGroup::Investments,
            ] {
                println!(
                    "{:<24} {:>16}",
                    group.label(),
                    format_currency(currency, summary.total(group))
                );
            }
            if !summary.uncategorized.is_zero() {
                println!(
                    "{:<24} {:>16}",
                    "Uncategorized",
                    format_currency(currency, summary.uncategorized)
                );
            }
            println!("{:<24} {:>16}", "Net", format_currency(currency, summary.net()));
            if summary.skipped_rows > 0 {
                println!("({} malformed row(s) skipped)", summary.skipped_rows);
            }
        }
    }
    Ok(())
}
