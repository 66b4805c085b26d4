//! TracingSink - forwards operations to `tracing`
//!
//! Every operation becomes one `debug` event under the
//! `lnxmirror::operations` target, so it can be enabled separately from
//! engine diagnostics (`RUST_LOG=lnxmirror::operations=debug`). Failures are
//! already reported at `warn` by the engine itself.

use lnxmirror_core::{domain::Operation, ports::operation_sink::IOperationSink};

/// Operation sink that records each operation as a structured tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl IOperationSink for TracingSink {
    fn notify(&self, operation: &Operation) {
        let kind = operation.kind();
        let source = operation.source().display();
        let destination = operation.destination().map(|d| d.display().to_string());
        let entry_type = operation.entry_type().label().trim_end();

        tracing::debug!(
            target: "lnxmirror::operations",
            kind = %kind,
            entry_type,
            source = %source,
            destination = destination.as_deref().unwrap_or_default(),
            detail = operation.detail().unwrap_or_default(),
            "{}",
            kind.tag()
        );
    }
}
