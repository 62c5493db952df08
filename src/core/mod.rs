pub mod batch;
pub mod compiler;
pub mod finance;
pub mod ledger;
pub mod money_flow;
pub mod pipeline;
pub mod runner;
pub mod template;
pub mod tips;

pub use crate::domain::model::{InvoiceOutcome, InvoiceRequest};
pub use crate::domain::ports::{ConfigProvider, DocumentCompiler};
pub use crate::utils::error::Result;
pub use compiler::LatexCompiler;
pub use pipeline::InvoicePipeline;
