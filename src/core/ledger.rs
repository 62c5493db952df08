use crate::domain::model::LedgerEntry;
use crate::utils::error::{Result, ToolkitError};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Append-only CSV history of generated invoices.
#[derive(Debug, Clone)]
pub struct InvoiceLedger {
    path: PathBuf,
}

impl InvoiceLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header first when the file is new or empty.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let ledger_error = |source: std::io::Error| ToolkitError::LedgerWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ledger_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(ledger_error)?;
        let needs_header = file.metadata().map_err(ledger_error)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(LedgerEntry::HEADER).map_err(csv_to_ledger(&self.path))?;
        }
        writer
            .write_record(entry.to_record())
            .map_err(csv_to_ledger(&self.path))?;
        writer.flush().map_err(ledger_error)?;

        tracing::info!(
            "Recorded invoice {} in {}",
            entry.invoice_number,
            self.path.display()
        );
        Ok(())
    }

    /// All recorded invoices; a missing ledger reads as empty.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
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
}

fn csv_to_ledger(path: &Path) -> impl Fn(csv::Error) -> ToolkitError + '_ {
    move |e| ToolkitError::LedgerWrite {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    }
}
