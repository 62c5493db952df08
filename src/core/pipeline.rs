use crate::core::ledger::InvoiceLedger;
use crate::core::template::{sanitize_invoice_number, TemplateEngine};
use crate::domain::model::{
    CompiledArtifact, InvoiceOutcome, InvoiceRequest, LedgerEntry, RenderedDocument,
};
use crate::domain::ports::{ConfigProvider, DocumentCompiler};
use crate::utils::error::{Result, ToolkitError};
use std::path::PathBuf;

/// Render → compile → record for a single invoice.
pub struct InvoicePipeline<C: DocumentCompiler> {
    template_path: PathBuf,
    output_dir: PathBuf,
    ledger: InvoiceLedger,
    compiler: C,
    currency: String,
}

impl<C: DocumentCompiler> InvoicePipeline<C> {
    pub fn new(
        template_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        ledger: InvoiceLedger,
        compiler: C,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            output_dir: output_dir.into(),
            ledger,
            compiler,
            currency: currency.into(),
        }
    }

    pub fn from_config<P: ConfigProvider + ?Sized>(config: &P, compiler: C) -> Self {
        Self::new(
            config.template_path(),
            config.output_dir(),
            InvoiceLedger::new(config.ledger_path()),
            compiler,
            config.currency_symbol(),
        )
    }

    pub fn ledger(&self) -> &InvoiceLedger {
        &self.ledger
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn render(&self, request: &InvoiceRequest) -> Result<RenderedDocument> {
        let engine = TemplateEngine::load(&self.template_path)?;
        let contents = engine.render(&request.fields, &request.items, &self.currency);

        let invoice_id = sanitize_invoice_number(&request.fields.invoice_number);
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("invoice_{}.tex", invoice_id));
        std::fs::write(&path, &contents)?;
        tracing::info!("Rendered invoice {} to {}", invoice_id, path.display());

        Ok(RenderedDocument {
            invoice_id,
            path,
            contents,
        })
    }

    pub async fn compile(&self, rendered: &RenderedDocument) -> Result<CompiledArtifact> {
        self.compiler.compile(&rendered.path).await
    }

    /// Appends the ledger row, but only for an artifact that is actually on disk.
    pub fn record(
        &self,
        request: &InvoiceRequest,
        artifact: &CompiledArtifact,
    ) -> Result<LedgerEntry> {
        if !artifact.path.is_file() {
            return Err(ToolkitError::CompileFailed {
                program: "compiler".to_string(),
                exit_code: artifact.exit_code,
                output_tail: format!("{} does not exist", artifact.path.display()),
                diagnostics: Vec::new(),
            });
        }
        let entry = LedgerEntry::for_invoice(&request.fields, &artifact.path);
        self.ledger.append(&entry)?;
        Ok(entry)
    }

    pub async fn run(&self, request: &InvoiceRequest) -> Result<InvoiceOutcome> {
        tracing::info!(
            "Generating invoice {:?} with {} item(s)",
            request.fields.invoice_number,
            request.items.len()
        );

        let rendered = self.render(request)?;
        let artifact = self.compile(&rendered).await?;
        // An artifact without a ledger row is possible here and left as is.
        self.record(request, &artifact)?;

        tracing::info!("Invoice ready at {}", artifact.path.display());
        Ok(InvoiceOutcome {
            source_path: rendered.path,
            artifact_path: artifact.path,
            warnings: artifact.warnings,
        })
    }
}
