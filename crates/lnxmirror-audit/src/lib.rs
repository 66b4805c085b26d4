//! LNXMirror Audit - Operation log and audit trail
//!
//! Provides:
//! - `OperationLog`: Append-only plain-text log of every mirror operation
//! - `TracingSink`: Forwards operations to `tracing` as structured events
//!
//! Both implement `IOperationSink` and never propagate write failures.

pub mod logger;
pub mod tracing_sink;

pub use logger::{read_tail, OperationLog};
pub use tracing_sink::TracingSink;
