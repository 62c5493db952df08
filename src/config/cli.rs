use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "solo-toolkit")]
#[command(about = "Invoices, tax estimates and cash-flow tracking for a one-person business")]
pub struct CliConfig {
    /// Path to a TOML configuration file (defaults to <base-dir>/toolkit.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the template, ledger and cash-flow log
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write a starter toolkit.toml and invoice template into the base directory
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Generate one invoice PDF and record it in the ledger
    Invoice(InvoiceArgs),
    /// Generate one invoice per row of a CSV file
    Batch {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List recorded invoices
    History,
    /// Estimate income tax for a financial year
    Tax(TaxArgs),
    /// Compare hourly earnings against the benchmark rate
    Productivity(ProductivityArgs),
    /// Record and review cash-flow entries
    Money {
        #[command(subcommand)]
        action: MoneyCommand,
    },
    /// Print a random business tip
    Tip,
    /// Fill in an invoice interactively
    Shell,
}

#[derive(Debug, Clone, Args)]
pub struct InvoiceArgs {
    /// TOML file with [fields] and [[items]]
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    /// Field override, e.g. --set billToName=Acme
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Item as "name|description|quantity|price|tax"
    #[arg(long = "item", value_name = "ITEM")]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaxArgs {
    #[arg(long)]
    pub income: Decimal,

    /// Investments under section 80C
    #[arg(long, default_value = "0")]
    pub investment: Decimal,

    /// Health insurance premium under section 80D
    #[arg(long, default_value = "0")]
    pub health_insurance: Decimal,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ProductivityArgs {
    /// Hours worked per day
    #[arg(long)]
    pub hours: Decimal,

    /// Profit per month
    #[arg(long)]
    pub profit: Decimal,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum MoneyCommand {
    /// Append one entry to the cash-flow log
    Record {
        /// Positive for money in, negative for money out
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,

        /// Category label or its number from `money categories`
        #[arg(long)]
        category: String,

        #[arg(long, default_value = "")]
        note: String,
    },
    /// List the available categories
    Categories,
    /// Totals per category group
    Summary,
}
