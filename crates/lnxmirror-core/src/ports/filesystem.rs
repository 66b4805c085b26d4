//! Mirror filesystem port (driven/secondary port)
//!
//! This module defines the filesystem primitives the mirroring engine needs:
//! listing, stat, directory creation, removal and mtime-preserving copies.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific;
//!   implementations attach the offending path as context.
//! - All methods are blocking. A mirror pass is a single synchronous,
//!   depth-first walk and never yields mid-recursion.
//! - `stat` does not follow symbolic links and reports a missing path as
//!   [`EntryKind::Missing`] instead of an error, so a file that vanishes
//!   between listing and stat is simply absent. `stat_followed` looks
//!   through a link at its target.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::domain::SkipReason;

// ============================================================================
// EntryState
// ============================================================================

/// What kind of filesystem object lives at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Nothing exists at the path
    Missing,
    /// A regular file
    File,
    /// A directory
    Directory,
    /// A symbolic link, as seen by `stat`
    Symlink,
    /// Sockets, FIFOs, device nodes
    Other,
}

/// Snapshot of a directory entry's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryState {
    /// Kind of entry found at the path
    pub kind: EntryKind,
    /// Size in bytes (0 for directories or missing entries)
    pub size: u64,
    /// Last modification time (None if not available or missing)
    pub modified: Option<DateTime<Utc>>,
}

impl EntryState {
    /// Returns a state representing a non-existent path
    pub fn not_found() -> Self {
        Self {
            kind: EntryKind::Missing,
            size: 0,
            modified: None,
        }
    }

    pub fn exists(&self) -> bool {
        self.kind != EntryKind::Missing
    }

    /// Returns true if the entry is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if the entry is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A source entry a recursive copy did not reproduce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

// ============================================================================
// IMirrorFileSystem trait
// ============================================================================

/// Port trait for the filesystem operations used by a mirror pass
///
/// ## Implementation Notes
///
/// - `copy_file` must preserve the source modification time on the
///   destination; otherwise every pass would see the file as changed.
/// - `copy_dir_all` copies a whole subtree, creating `dst` itself. Links to
///   regular files are copied as files; every other link or special file is
///   skipped and returned.
/// - `remove_dir` only removes an empty directory.
pub trait IMirrorFileSystem: Send + Sync {
    /// Lists the names of the immediate children of a directory
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read
    fn list_dir(&self, path: &Path) -> anyhow::Result<Vec<OsString>>;

    /// Gets the state of the entry at `path` without following symlinks
    ///
    /// Returns `EntryState::not_found()` for missing paths.
    fn stat(&self, path: &Path) -> anyhow::Result<EntryState>;

    /// Gets the state of the entry at `path`, following symlinks
    ///
    /// A dangling link yields `EntryState::not_found()`.
    fn stat_followed(&self, path: &Path) -> anyhow::Result<EntryState>;

    /// Creates a directory and all parent directories as needed
    fn create_dir_all(&self, path: &Path) -> anyhow::Result<()>;

    /// Removes a single file (or symbolic link)
    fn remove_file(&self, path: &Path) -> anyhow::Result<()>;

    /// Removes an empty directory
    fn remove_dir(&self, path: &Path) -> anyhow::Result<()>;

    /// Removes a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()>;

    /// Copies a regular file (or the file a link points to), replacing `dst`
    /// and preserving the mtime
    fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()>;

    /// Copies a directory tree rooted at `src` to `dst`
    ///
    /// Returns the entries that were left out.
    fn copy_dir_all(&self, src: &Path, dst: &Path) -> anyhow::Result<Vec<SkippedEntry>>;

    /// Compares the bytes of two regular files
    fn contents_equal(&self, a: &Path, b: &Path) -> anyhow::Result<bool>;
}
