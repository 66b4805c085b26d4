//! Domain entities
//!
//! This module contains the core domain types for LNXMirror:
//! - Directory handles for the source and replica roots
//! - One-level comparison results
//! - Operation records emitted for every filesystem mutation
//! - Domain-specific error types

pub mod comparison;
pub mod errors;
pub mod handle;
pub mod operation;

// Re-export commonly used types
pub use comparison::{ComparisonResult, SkipReason};
pub use errors::DomainError;
pub use handle::DirectoryHandle;
pub use operation::{EntryType, Operation, OperationKind};
