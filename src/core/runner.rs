//! Runs invoice generation off the interactive loop.
//!
//! The interactive side owns an [`InFlightGuard`] and the receiving half of the completion
//! channel. Each generation gets its own worker thread, which reports back exactly once with a
//! [`Completion`] and never touches interactive state.

use crate::core::pipeline::InvoicePipeline;
use crate::domain::model::{InvoiceOutcome, InvoiceRequest};
use crate::domain::ports::DocumentCompiler;
use crate::utils::error::{Result, ToolkitError};
use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;

const WORKER_THREAD_NAME: &str = "invoice-worker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobTicket(u64);

impl JobTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single slot. A second acquire while a ticket is out is rejected, never queued.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    current: Option<JobTicket>,
    issued: u64,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self) -> Result<JobTicket> {
        if self.current.is_some() {
            return Err(ToolkitError::Busy);
        }
        self.issued += 1;
        let ticket = JobTicket(self.issued);
        self.current = Some(ticket);
        Ok(ticket)
    }

    /// Frees the slot if `ticket` is the one holding it.
    pub fn release(&mut self, ticket: JobTicket) -> bool {
        if self.current == Some(ticket) {
            self.current = None;
            true
        } else {
            tracing::warn!("Ignoring release of stale ticket {}", ticket);
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<JobTicket> {
        self.current
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: JobTicket,
    pub result: std::result::Result<InvoiceOutcome, String>,
}

pub struct BackgroundRunner<C: DocumentCompiler + 'static> {
    pipeline: Arc<InvoicePipeline<C>>,
    sender: mpsc::UnboundedSender<Completion>,
}

impl<C: DocumentCompiler + 'static> BackgroundRunner<C> {
    pub fn new(pipeline: Arc<InvoicePipeline<C>>) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { pipeline, sender }, receiver)
    }

    pub fn pipeline(&self) -> &InvoicePipeline<C> {
        &self.pipeline
    }

    /// Starts one worker thread for `request`. The completion for `ticket` arrives on the
    /// receiver returned by [`BackgroundRunner::new`].
    pub fn spawn(&self, ticket: JobTicket, request: InvoiceRequest) -> Result<JoinHandle<()>> {
        let pipeline = Arc::clone(&self.pipeline);
        let sender = self.sender.clone();

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime
                        .block_on(pipeline.run(&request))
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(format!("Could not start worker runtime: {}", e)),
                };

                match &result {
                    Ok(outcome) => tracing::debug!(
                        "Job {} finished: {}",
                        ticket,
                        outcome.artifact_path.display()
                    ),
                    Err(message) => tracing::debug!("Job {} failed: {}", ticket, message),
                }
                if sender.send(Completion { ticket, result }).is_err() {
                    tracing::warn!("Completion for job {} dropped, receiver is gone", ticket);
                }
            })
            .map_err(|e| ToolkitError::WorkerError {
                message: format!("could not spawn {}: {}", WORKER_THREAD_NAME, e),
            })?;

        tracing::info!("Started invoice job {}", ticket);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejects_second_acquire() {
        let mut guard = InFlightGuard::new();
        let first = guard.try_acquire().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_acquire(), Err(ToolkitError::Busy)));

        assert!(guard.release(first));
        assert!(!guard.is_busy());
        let second = guard.try_acquire().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_guard_ignores_stale_ticket() {
        let mut guard = InFlightGuard::new();
        let first = guard.try_acquire().unwrap();
        guard.release(first);
        let second = guard.try_acquire().unwrap();

        assert!(!guard.release(first));
        assert_eq!(guard.current(), Some(second));
    }
}
