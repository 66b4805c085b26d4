//! Root path resolution
//!
//! Turns the configured (possibly relative) source and replica paths into
//! [`DirectoryHandle`]s anchored at a fixed base directory, creating the
//! directories that do not exist yet.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use lnxmirror_core::{
    domain::{DirectoryHandle, EntryType, Operation},
    ports::{filesystem::IMirrorFileSystem, operation_sink::IOperationSink},
};
use tracing::{debug, info, warn};

use crate::MirrorError;

/// Resolves configured root paths to absolute directory handles
#[derive(Clone)]
pub struct PathResolver {
    base: DirectoryHandle,
    fs: Arc<dyn IMirrorFileSystem>,
    sink: Arc<dyn IOperationSink>,
}

impl PathResolver {
    /// Create a resolver anchored at `base`
    ///
    /// # Errors
    /// Returns [`MirrorError::DomainError`] if `base` is not absolute.
    pub fn new(
        base: PathBuf,
        fs: Arc<dyn IMirrorFileSystem>,
        sink: Arc<dyn IOperationSink>,
    ) -> Result<Self, MirrorError> {
        Ok(Self {
            base: DirectoryHandle::new(base)?,
            fs,
            sink,
        })
    }

    /// Create a resolver anchored at the process working directory
    ///
    /// # Errors
    /// Returns [`MirrorError::Access`] if the working directory cannot be
    /// determined.
    pub fn from_current_dir(
        fs: Arc<dyn IMirrorFileSystem>,
        sink: Arc<dyn IOperationSink>,
    ) -> Result<Self, MirrorError> {
        let cwd = std::env::current_dir().map_err(|e| MirrorError::Access {
            path: PathBuf::from("."),
            reason: e.to_string(),
        })?;
        Self::new(cwd, fs, sink)
    }

    /// The directory relative paths are anchored at
    pub fn base(&self) -> &Path {
        self.base.path()
    }

    /// Resolve `configured` and make sure the directory exists
    ///
    /// A missing directory is created (with parents) and reported as a
    /// `Create` operation. If creation fails an `Error` operation is emitted
    /// and the handle is still returned; it simply names a directory that
    /// does not exist.
    ///
    /// # Errors
    /// Returns [`MirrorError::DomainError`] if the path climbs above the
    /// filesystem root.
    pub fn resolve(&self, configured: &Path) -> Result<DirectoryHandle, MirrorError> {
        let handle = DirectoryHandle::resolve(configured, self.base.path())?;

        let present = self
            .fs
            .stat(handle.path())
            .map(|state| state.is_directory())
            .unwrap_or(false);

        if present {
            debug!(path = %handle, "Directory present");
            return Ok(handle);
        }

        match self.fs.create_dir_all(handle.path()) {
            Ok(()) => {
                info!(path = %handle, "Created missing directory");
                self.sink.notify(&Operation::create(handle.path()));
            }
            Err(e) => {
                warn!(path = %handle, error = %format!("{e:#}"), "Failed to create directory");
                self.sink.notify(&Operation::error(
                    handle.path(),
                    EntryType::Directory,
                    e.root_cause().to_string(),
                ));
            }
        }

        Ok(handle)
    }

    /// Remove the directory at `configured`, with everything below it
    ///
    /// Used to start from an empty replica. Emits a single `Delete` for the
    /// root when something was removed, or an `Error` if removal failed.
    /// Returns whether a directory was removed.
    ///
    /// # Errors
    /// Returns [`MirrorError::DomainError`] if the path climbs above the
    /// filesystem root.
    pub fn remove_tree(&self, configured: &Path) -> Result<bool, MirrorError> {
        let handle = DirectoryHandle::resolve(configured, self.base.path())?;

        let is_dir = self
            .fs
            .stat(handle.path())
            .map(|state| state.is_directory())
            .unwrap_or(false);
        if !is_dir {
            debug!(path = %handle, "Nothing to remove");
            return Ok(false);
        }

        match self.fs.remove_dir_all(handle.path()) {
            Ok(()) => {
                info!(path = %handle, "Removed directory tree");
                self.sink
                    .notify(&Operation::delete(handle.path(), EntryType::Directory));
                Ok(true)
            }
            Err(e) => {
                warn!(path = %handle, error = %format!("{e:#}"), "Failed to remove directory tree");
                self.sink.notify(&Operation::error(
                    handle.path(),
                    EntryType::Directory,
                    e.root_cause().to_string(),
                ));
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
