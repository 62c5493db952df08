use crate::domain::category::{Category, CategoryGroup};
use crate::domain::model::CashFlowEntry;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::format::round_money;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const HEADER: [&str; 4] = ["timestamp", "amount", "category", "note"];
const EMPTY_NOTE: &str = "None";

/// Append-only CSV log of money coming in and going out.
///
/// Amounts are signed: positive is money in, negative is money out. A refund is recorded with
/// the opposite sign under the category it reverses.
#[derive(Debug, Clone)]
pub struct CashFlowLog {
    path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CashFlowSummary {
    /// Signed sum of the amounts in each group.
    pub by_group: BTreeMap<CategoryGroup, Decimal>,
    /// Signed sum of rows whose category is not one of the known labels.
    pub uncategorized: Decimal,
    pub entries: usize,
    pub skipped_rows: usize,
}

impl CashFlowSummary {
    pub fn total(&self, group: CategoryGroup) -> Decimal {
        self.by_group.get(&group).copied().unwrap_or(Decimal::ZERO)
    }

    /// Every row added up, uncategorized ones included.
    pub fn net(&self) -> Decimal {
        self.by_group.values().copied().sum::<Decimal>() + self.uncategorized
    }
}

impl CashFlowLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, amount: Decimal, category: Category, note: &str) -> Result<CashFlowEntry> {
        let amount = round_money(amount);
        if amount.is_zero() {
            return Err(ToolkitError::validation("Amount should not be zero."));
        }

        let note = note.trim();
        let entry = CashFlowEntry {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            amount,
            category: category.label().to_string(),
            note: if note.is_empty() {
                EMPTY_NOTE.to_string()
            } else {
                note.to_string()
            },
        };
        self.append(&entry)?;

        tracing::info!(
            "Logged {} entry of {:.2} in {}",
            entry.category,
            entry.amount,
            self.path.display()
        );
        Ok(entry)
    }

    fn append(&self, entry: &CashFlowEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        let amount = format!("{:.2}", entry.amount);
        writer.write_record([
            entry.timestamp.as_str(),
            amount.as_str(),
            entry.category.as_str(),
            entry.note.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<CashFlowEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Totals per presentation group. Malformed rows are skipped and counted.
    pub fn summary(&self) -> Result<CashFlowSummary> {
        let mut summary = CashFlowSummary::default();
        if !self.path.exists() {
            return Ok(summary);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        for row in reader.deserialize::<CashFlowEntry>() {
            let entry = match row {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping malformed cash-flow row: {}", e);
                    summary.skipped_rows += 1;
                    continue;
                }
            };
            summary.entries += 1;
            match Category::from_label(&entry.category) {
                Some(category) => {
                    *summary.by_group.entry(category.group()).or_insert(Decimal::ZERO) += entry.amount;
                }
                None => summary.uncategorized += entry.amount,
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_record_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let log = CashFlowLog::new(dir.path().join("moneyFlow.csv"));

        let entry = log.record(dec!(2500), Category::SalesRevenue, "  ").unwrap();
        assert_eq!(entry.note, "None");
        assert_eq!(entry.category, "Sales Revenue");
        log.record(dec!(-300.5), Category::Insurance, "annual premium").unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,amount,category,note");
        assert!(lines[1].ends_with(",2500.00,Sales Revenue,None"));
        assert!(lines[2].ends_with(",-300.50,Insurance,annual premium"));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let dir = TempDir::new().unwrap();
        let log = CashFlowLog::new(dir.path().join("moneyFlow.csv"));
        assert!(log.record(Decimal::ZERO, Category::SalesRevenue, "").is_err());
        // Rounds to zero cents.
        assert!(log.record(dec!(0.004), Category::SalesRevenue, "").is_err());
        assert!(!log.path().exists());
    }

    #[test]
    fn test_summary_groups_signed_amounts() {
        let dir = TempDir::new().unwrap();
        let log = CashFlowLog::new(dir.path().join("moneyFlow.csv"));
        log.record(dec!(10_000), Category::SalesRevenue, "").unwrap();
        log.record(dec!(-2_000), Category::Insurance, "").unwrap();
        log.record(dec!(-500), Category::PremiumTools, "").unwrap();
        log.record(dec!(-1_500), Category::ResearchAndDevelopment, "").unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        std::io::Write::write_all(&mut file, b"2024-01-01 10:00:00,50.00,Lottery,None\nbroken\n").unwrap();

        let summary = log.summary().unwrap();
        assert_eq!(summary.entries, 5);
        assert_eq!(summary.skipped_rows, 1);
        assert_eq!(summary.total(CategoryGroup::Inflow), dec!(10_000));
        assert_eq!(summary.total(CategoryGroup::Needs), dec!(-2_000));
        assert_eq!(summary.total(CategoryGroup::Wants), dec!(-500));
        assert_eq!(summary.total(CategoryGroup::Investments), dec!(-1_500));
        assert_eq!(summary.uncategorized, dec!(50));
        assert_eq!(summary.net(), dec!(6_050));

        assert_eq!(log.entries().unwrap_err().category(), crate::utils::error::ErrorCategory::Io);
    }

    #[test]
    fn test_refund_reduces_inflow() {
        let dir = TempDir::new().unwrap();
        let log = CashFlowLog::new(dir.path().join("moneyFlow.csv"));
        log.record(dec!(1_000), Category::SalesRevenue, "").unwrap();
        log.record(dec!(-250), Category::SalesRevenue, "refund to client").unwrap();
        log.record(dec!(-100), Category::Insurance, "").unwrap();
        log.record(dec!(40), Category::Insurance, "premium refund").unwrap();

        let summary = log.summary().unwrap();
        assert_eq!(summary.total(CategoryGroup::Inflow), dec!(750));
        assert_eq!(summary.total(CategoryGroup::Needs), dec!(-60));
        assert_eq!(summary.net(), dec!(690));

        let entries = log.entries().unwrap();
        assert_eq!(entries[1].amount, dec!(-250));
        assert_eq!(entries[1].note, "refund to client");
    }
}
