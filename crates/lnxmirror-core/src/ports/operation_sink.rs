//! Operation sink port (driven/secondary port)
//!
//! The mirroring engine reports every filesystem operation it performs, and
//! every one that fails, through this interface. Implementations render the
//! operation to a terminal, append it to a log file, forward it to
//! `tracing`, or record it for tests.
//!
//! ## Design Notes
//!
//! - Notification is infallible from the engine's point of view. A sink that
//!   cannot deliver (e.g. the log file became unwritable) must swallow the
//!   error itself; logging failures never interrupt a mirror pass.
//! - The engine guarantees exactly one `notify` per mutation and never
//!   notifies for read-only comparisons.

use std::sync::Arc;

use crate::domain::operation::Operation;

/// Port trait for receiving operation notifications
pub trait IOperationSink: Send + Sync {
    /// Receives a single operation record
    fn notify(&self, operation: &Operation);
}

/// Fans every notification out to several sinks, in registration order
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn IOperationSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink to the fan-out list
    pub fn with_sink(mut self, sink: Arc<dyn IOperationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl IOperationSink for CompositeSink {
    fn notify(&self, operation: &Operation) {
        for sink in &self.sinks {
            sink.notify(operation);
        }
    }
}

impl std::fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
