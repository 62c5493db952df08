pub mod batch;
pub mod session;
pub mod shell;

pub use batch::{run_batch, BatchResult};
pub use session::{InvoiceSession, SessionCommand};
pub use shell::run_shell;
