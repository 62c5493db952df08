use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("Invoice template is missing: {}", path.display())]
    TemplateMissing { path: PathBuf },

    #[error("{program} is not installed or not available in PATH. Please install it to generate PDFs.")]
    ToolchainMissing { program: String },

    #[error("PDF generation timed out after {seconds} seconds. The LaTeX file might be too complex or there's an issue with {program}.")]
    CompileTimeout { program: String, seconds: u64 },

    #[error("{}", compile_failure_message(program, *exit_code, output_tail, diagnostics))]
    CompileFailed {
        program: String,
        exit_code: Option<i32>,
        output_tail: String,
        diagnostics: Vec<String>,
    },

    #[error("Could not append to invoice ledger {}: {source}", path.display())]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("An invoice is already being generated")]
    Busy,

    #[error("Background worker failed: {message}")]
    WorkerError { message: String },

    #[error("{failed} of {total} batch invoices failed")]
    BatchIncomplete { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, ToolkitError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Dependency,
    Timeout,
    Compilation,
    Ledger,
    Io,
    Config,
    Input,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

fn compile_failure_message(
    program: &str,
    exit_code: Option<i32>,
    output_tail: &str,
    diagnostics: &[String],
) -> String {
    let code = exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());
    if diagnostics.is_empty() {
        format!(
            "PDF generation failed (exit code {}).\n{} output:\n{}",
            code, program, output_tail
        )
    } else {
        format!(
            "PDF generation failed (exit code {}).\n{}",
            code,
            diagnostics.join("\n")
        )
    }
}

impl ToolkitError {
    pub fn validation(message: impl Into<String>) -> Self {
        ToolkitError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ToolkitError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolkitError::TemplateMissing { .. } | ToolkitError::ToolchainMissing { .. } => {
                ErrorCategory::Dependency
            }
            ToolkitError::CompileTimeout { .. } => ErrorCategory::Timeout,
            ToolkitError::CompileFailed { .. } | ToolkitError::BatchIncomplete { .. } => {
                ErrorCategory::Compilation
            }
            ToolkitError::LedgerWrite { .. } => ErrorCategory::Ledger,
            ToolkitError::IoError(_) | ToolkitError::CsvError(_) => ErrorCategory::Io,
            ToolkitError::SerializationError(_)
            | ToolkitError::ConfigError { .. }
            | ToolkitError::ConfigValidationError { .. }
            | ToolkitError::InvalidConfigValueError { .. }
            | ToolkitError::MissingConfigError { .. } => ErrorCategory::Config,
            ToolkitError::ValidationError { .. } | ToolkitError::Busy => ErrorCategory::Input,
            ToolkitError::WorkerError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ToolkitError::TemplateMissing { .. }
            | ToolkitError::ToolchainMissing { .. }
            | ToolkitError::WorkerError { .. } => ErrorSeverity::Critical,
            ToolkitError::CompileTimeout { .. }
            | ToolkitError::CompileFailed { .. }
            | ToolkitError::LedgerWrite { .. }
            | ToolkitError::BatchIncomplete { .. }
            | ToolkitError::IoError(_) => ErrorSeverity::High,
            ToolkitError::CsvError(_)
            | ToolkitError::SerializationError(_)
            | ToolkitError::ConfigError { .. }
            | ToolkitError::ConfigValidationError { .. }
            | ToolkitError::InvalidConfigValueError { .. }
            | ToolkitError::MissingConfigError { .. } => ErrorSeverity::Medium,
            ToolkitError::ValidationError { .. } | ToolkitError::Busy => ErrorSeverity::Low,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ToolkitError::LedgerWrite { path, .. } => format!(
                "The PDF was created but the invoice could not be recorded in {}",
                path.display()
            ),
            ToolkitError::IoError(e) => format!("A file operation failed: {}", e),
            ToolkitError::WorkerError { .. } => {
                "Invoice generation stopped unexpectedly".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ToolkitError::TemplateMissing { .. } => {
                "Run `solo-toolkit init` or point [paths].template at an existing template"
            }
            ToolkitError::ToolchainMissing { .. } => {
                "Install a TeX distribution that provides the compiler, or set [compiler].program"
            }
            ToolkitError::CompileTimeout { .. } => {
                "Simplify the template or raise [compiler].timeout_seconds"
            }
            ToolkitError::CompileFailed { .. } => {
                "Check the template for LaTeX errors; the compiler log is kept beside the document"
            }
            ToolkitError::LedgerWrite { .. } => {
                "Make sure the ledger file is writable and not open in another program"
            }
            ToolkitError::IoError(_) | ToolkitError::CsvError(_) => {
                "Check file permissions and available disk space"
            }
            ToolkitError::SerializationError(_)
            | ToolkitError::ConfigError { .. }
            | ToolkitError::ConfigValidationError { .. }
            | ToolkitError::InvalidConfigValueError { .. }
            | ToolkitError::MissingConfigError { .. } => "Review toolkit.toml and command arguments",
            ToolkitError::ValidationError { .. } => "Correct the input and try again",
            ToolkitError::Busy => "Wait for the current invoice to finish",
            ToolkitError::WorkerError { .. } => "Run again with --verbose and inspect the logs",
            ToolkitError::BatchIncomplete { .. } => {
                "Fix the rows reported above and run them again; finished rows are already in the ledger"
            }
        }
    }
}
