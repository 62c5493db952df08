use crate::app::session::complete_request;
use crate::core::batch::BatchRow;
use crate::core::pipeline::InvoicePipeline;
use crate::domain::model::InvoiceOutcome;
use crate::domain::ports::DocumentCompiler;
use crate::utils::error::Result;
use chrono::{DateTime, Local};

/// What happened to one batch row.
#[derive(Debug)]
pub struct BatchResult {
    pub row: usize,
    /// Invoice number after defaults were applied; `None` when the row did not parse.
    pub invoice_number: Option<String>,
    pub outcome: Result<InvoiceOutcome>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Generates every parsed row in order. A row that failed to parse, or whose generation fails,
/// is reported and the next row still runs.
pub async fn run_batch<C: DocumentCompiler>(
    pipeline: &InvoicePipeline<C>,
    rows: Vec<BatchRow>,
    currency: &str,
    now: DateTime<Local>,
) -> Vec<BatchResult> {
    let mut results = Vec::with_capacity(rows.len());
    for BatchRow { row, request } in rows {
        let result = match request {
            Ok(mut request) => {
                complete_request(&mut request, currency, now);
                let outcome = pipeline.run(&request).await;
                BatchResult {
                    row,
                    invoice_number: Some(request.fields.invoice_number),
                    outcome,
                }
            }
            Err(e) => BatchResult {
                row,
                invoice_number: None,
                outcome: Err(e),
            },
        };
        if let Err(e) = &result.outcome {
            tracing::warn!("Batch row {} failed: {}", row, e);
        }
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::read_batch;
    use crate::core::ledger::InvoiceLedger;
    use crate::domain::model::CompiledArtifact;
    use crate::utils::error::ToolkitError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::TempDir;

    /// Fails for any document whose name contains `fail`.
    struct PickyCompiler;

    #[async_trait]
    impl DocumentCompiler for PickyCompiler {
        async fn compile(&self, source: &Path) -> Result<CompiledArtifact> {
            let name = source.file_name().map(|n| n.to_string_lossy().into_owned());
            if name.unwrap_or_default().contains("fail") {
                return Err(ToolkitError::CompileFailed {
                    program: "mocktex".to_string(),
                    exit_code: Some(1),
                    output_tail: "No output".to_string(),
                    diagnostics: Vec::new(),
                });
            }
            let path = self.artifact_path(source);
            std::fs::write(&path, b"%PDF")?;
            Ok(CompiledArtifact {
                path,
                exit_code: Some(0),
                warnings: false,
            })
        }
    }

    fn pipeline(dir: &TempDir) -> InvoicePipeline<PickyCompiler> {
        let template = dir.path().join("invoiceTemplate.tex");
        std::fs::write(&template, "\\newcommand{\\invoiceNumber}{0}\n%%ITEM_ROWS%%\n").unwrap();
        InvoicePipeline::new(
            template,
            dir.path(),
            InvoiceLedger::new(dir.path().join("invoiceHistory.csv")),
            PickyCompiler,
            "₹",
        )
    }

    #[tokio::test]
    async fn test_unparseable_row_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("batch.csv");
        std::fs::write(
            &input,
            "invoiceNumber,item1Name,item1Price\n\
             INV-1,Design,100\n\
             INV-2,Design,lots\n\
             INV-3,Hosting,50\n",
        )
        .unwrap();
        let pipeline = pipeline(&dir);
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();

        let results = run_batch(&pipeline, read_batch(&input).unwrap(), "₹", now).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);

        assert!(results[0].is_ok());
        assert_eq!(results[1].row, 2);
        assert!(results[1].invoice_number.is_none());
        assert!(matches!(
            results[1].outcome,
            Err(ToolkitError::ValidationError { .. })
        ));
        assert!(results[2].is_ok());

        let entries = pipeline.ledger().entries().unwrap();
        let numbers: Vec<&str> = entries.iter().map(|e| e.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-1", "INV-3"]);
        assert_eq!(entries[1].total_amount, "₹50.00");
        assert_eq!(entries[1].invoice_date, "05/03/2024");
    }

    #[tokio::test]
    async fn test_failed_generation_continues_with_next_row() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("batch.csv");
        std::fs::write(&input, "invoiceNumber,billToName\nfail-1,Acme\n,Globex\n").unwrap();
        let pipeline = pipeline(&dir);
        let now = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();

        let results = run_batch(&pipeline, read_batch(&input).unwrap(), "₹", now).await;
        assert!(matches!(
            results[0].outcome,
            Err(ToolkitError::CompileFailed { .. })
        ));
        assert_eq!(results[0].invoice_number.as_deref(), Some("fail-1"));
        assert_eq!(results[1].invoice_number.as_deref(), Some("20241231-2359"));
        let outcome = results[1].outcome.as_ref().unwrap();
        assert_eq!(outcome.artifact_path, dir.path().join("invoice_20241231-2359.pdf"));
    }
}
