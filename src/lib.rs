pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::{compiler::LatexCompiler, pipeline::InvoicePipeline};
pub use domain::model::{InvoiceFields, InvoiceOutcome, InvoiceRequest, LineItem};
pub use utils::error::{Result, ToolkitError};
