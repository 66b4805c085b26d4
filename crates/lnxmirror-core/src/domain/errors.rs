//! Domain error types
//!
//! Errors raised while constructing or validating domain values, such as
//! resolving a configured root path into a [`DirectoryHandle`](super::DirectoryHandle).

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
