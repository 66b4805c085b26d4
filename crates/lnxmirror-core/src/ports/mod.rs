//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the traits the mirroring engine depends on. Their production
//! implementations live in adapter crates; tests substitute doubles.
//!
//! ## Ports Overview
//!
//! - [`IMirrorFileSystem`] - Directory listing, stat, copy and removal
//! - [`IOperationSink`] - Receives one notification per filesystem operation

pub mod filesystem;
pub mod operation_sink;

pub use filesystem::{EntryKind, EntryState, IMirrorFileSystem};
pub use operation_sink::{CompositeSink, IOperationSink};
