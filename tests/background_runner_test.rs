use async_trait::async_trait;
use solo_toolkit::app::session::InvoiceSession;
use solo_toolkit::app::shell::run_loop;
use solo_toolkit::core::ledger::InvoiceLedger;
use solo_toolkit::core::runner::{BackgroundRunner, InFlightGuard};
use solo_toolkit::domain::model::{CompiledArtifact, FieldKey, InvoiceFields, InvoiceRequest};
use solo_toolkit::domain::ports::DocumentCompiler;
use solo_toolkit::{InvoicePipeline, Result, ToolkitError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::error::TryRecvError;

struct SlowCompiler {
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl DocumentCompiler for SlowCompiler {
    async fn compile(&self, source: &Path) -> Result<CompiledArtifact> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(ToolkitError::CompileFailed {
                program: "mocktex".to_string(),
                exit_code: Some(1),
                output_tail: "No output".to_string(),
                diagnostics: vec!["! Missing $ inserted.".to_string()],
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

fn pipeline(dir: &TempDir, compiler: SlowCompiler) -> Arc<InvoicePipeline<SlowCompiler>> {
    let template = dir.path().join("invoiceTemplate.tex");
    std::fs::write(&template, "\\newcommand{\\invoiceNumber}{0}\n%%ITEM_ROWS%%\n").unwrap();
    Arc::new(InvoicePipeline::new(
        template,
        dir.path().join("out"),
        InvoiceLedger::new(dir.path().join("invoiceHistory.csv")),
        compiler,
        "₹",
    ))
}

fn request(number: &str) -> InvoiceRequest {
    InvoiceRequest::new(
        InvoiceFields::default().with(FieldKey::InvoiceNumber, number),
        Vec::new(),
    )
}

#[tokio::test]
async fn test_runner_delivers_exactly_one_completion() {
    let dir = TempDir::new().unwrap();
    let compiler = SlowCompiler {
        delay: Duration::from_millis(10),
        fail: false,
    };
    let (runner, mut completions) = BackgroundRunner::new(pipeline(&dir, compiler));
    let mut guard = InFlightGuard::new();

    let ticket = guard.try_acquire().unwrap();
    let handle = runner.spawn(ticket, request("R-1")).unwrap();
    assert_eq!(handle.thread().name(), Some("invoice-worker"));

    let completion = completions.recv().await.unwrap();
    handle.join().unwrap();
    assert_eq!(completion.ticket, ticket);
    let outcome = completion.result.unwrap();
    assert_eq!(outcome.artifact_path, dir.path().join("out/invoice_R-1.pdf"));
    assert!(matches!(completions.try_recv(), Err(TryRecvError::Empty)));

    assert!(guard.release(ticket));
    assert_eq!(runner.pipeline().ledger().entries().unwrap().len(), 1);
}

#[tokio::test]
async fn test_runner_reports_failure_as_message() {
    let dir = TempDir::new().unwrap();
    let compiler = SlowCompiler {
        delay: Duration::from_millis(1),
        fail: true,
    };
    let (runner, mut completions) = BackgroundRunner::new(pipeline(&dir, compiler));
    let ticket = InFlightGuard::new().try_acquire().unwrap();

    runner.spawn(ticket, request("R-2")).unwrap();
    let completion = completions.recv().await.unwrap();
    let message = completion.result.unwrap_err();
    assert!(message.contains("! Missing $ inserted."), "{}", message);
    assert!(!dir.path().join("invoiceHistory.csv").exists());
}

#[tokio::test]
async fn test_shell_rejects_second_generate_and_waits_on_quit() {
    let dir = TempDir::new().unwrap();
    let compiler = SlowCompiler {
        delay: Duration::from_millis(300),
        fail: false,
    };
    let (runner, completions) = BackgroundRunner::new(pipeline(&dir, compiler));
    let session = InvoiceSession::new(runner, "₹");

    let script: &[u8] = b"set invoiceNumber S-1\n\
item Consulting | March retainer | 1 | 25000 | 18\n\
generate\n\
generate\n\
status\n\
quit\n";
    let mut out = Vec::new();
    run_loop(session, completions, script, &mut out).await.unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Added Consulting (₹29500.00)"), "{}", out);
    assert!(out.contains("Generating invoice #1 in the background"), "{}", out);
    assert!(out.contains("An invoice is already being generated"), "{}", out);
    assert!(out.contains("Invoice #1 is being generated"), "{}", out);
    assert!(out.contains("Waiting for the running invoice to finish"), "{}", out);
    assert!(out.contains("Invoice generated: "), "{}", out);

    let ledger = InvoiceLedger::new(dir.path().join("invoiceHistory.csv"));
    let entries = ledger.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].invoice_number, "S-1");
    assert_eq!(entries[0].total_amount, "₹29,500.00");
}

#[tokio::test]
async fn test_shell_eof_acts_like_quit() {
    let dir = TempDir::new().unwrap();
    let compiler = SlowCompiler {
        delay: Duration::from_millis(1),
        fail: false,
    };
    let (runner, completions) = BackgroundRunner::new(pipeline(&dir, compiler));
    let session = InvoiceSession::new(runner, "₹");

    let script: &[u8] = b"bogus\ngenerate\n";
    let mut out = Vec::new();
    run_loop(session, completions, script, &mut out).await.unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("unknown command 'bogus'"), "{}", out);
    assert!(out.contains("No items added. Use `generate force`"), "{}", out);
    assert!(!dir.path().join("invoiceHistory.csv").exists());
}
