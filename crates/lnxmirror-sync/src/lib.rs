//! LNXMirror Sync - One-way tree mirroring engine
//!
//! Provides:
//! - Recursive source/replica comparison
//! - Reconciliation (copy, delete, update) with source always winning
//! - Fixed-period re-execution until cancelled
//!
//! ## Modules
//!
//! - [`filesystem`] - Local filesystem adapter (mtime-preserving copies)
//! - [`resolver`] - Root path resolution and bootstrap
//! - [`comparator`] - One-level directory partitioning
//! - [`reconciler`] - Mirror pass orchestrating compare/recurse/apply
//! - [`scheduler`] - Periodic pass driver

pub mod comparator;
pub mod filesystem;
pub mod reconciler;
pub mod resolver;
pub mod scheduler;

use std::path::PathBuf;

use thiserror::Error;

pub use comparator::TreeComparator;
pub use filesystem::LocalFileSystemAdapter;
pub use reconciler::{MirrorReport, PassOutcome, Reconciler};
pub use resolver::PathResolver;
pub use scheduler::MirrorScheduler;

/// Errors that can occur while mirroring
///
/// `MissingSource` and `MissingBoth` are outcomes of the sanitize step rather
/// than failures: the reconciler handles them itself and reports them through
/// [`PassOutcome`]. `Access` is raised by the comparator and is turned into an
/// `Error` operation by the reconciler.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A path could not be created, read or removed
    #[error("Cannot access {path}: {reason}")]
    Access { path: PathBuf, reason: String },

    /// The source directory no longer exists; the replica is cascade-deleted
    #[error("Source directory missing: {0}")]
    MissingSource(PathBuf),

    /// Neither the source nor the replica exists
    #[error("Source and replica both missing: {0}")]
    MissingBoth(PathBuf),

    /// The scheduler period must be greater than zero
    #[error("Invalid mirror period: must be greater than zero")]
    InvalidPeriod,

    /// A domain-level error propagated from lnxmirror-core
    #[error("Domain error: {0}")]
    DomainError(#[from] lnxmirror_core::domain::errors::DomainError),
}

impl MirrorError {
    /// Builds an [`MirrorError::Access`] from any error, keeping its full
    /// context chain in the reason
    pub fn access(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Access {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}
