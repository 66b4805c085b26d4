//! One-level directory comparison
//!
//! [`TreeComparator`] partitions the immediate children of a source/replica
//! directory pair. It only reads: it never mutates the filesystem and never
//! notifies an operation sink.
//!
//! File equality follows the shallow rule used by classic directory
//! comparison tools: different sizes mean different content, equal size and
//! equal modification time mean identical content, and anything else is
//! settled by comparing bytes.
//!
//! On the source side a symbolic link to a regular file stands for that
//! file. Links to directories, dangling links and special files are skipped
//! and listed in [`ComparisonResult::skipped`].

use std::{
    collections::BTreeSet,
    ffi::OsString,
    path::Path,
    sync::Arc,
};

use lnxmirror_core::{
    domain::{ComparisonResult, SkipReason},
    ports::filesystem::{EntryKind, EntryState, IMirrorFileSystem},
};
use tracing::{debug, trace};

use crate::MirrorError;

/// How a child participates in the comparison on one side of the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Absent,
    File,
    Directory,
    /// Present but not a regular file or directory (symlink, FIFO, ...)
    Special,
}

impl Side {
    fn of(state: &EntryState) -> Self {
        match state.kind {
            EntryKind::Missing => Side::Absent,
            EntryKind::File => Side::File,
            EntryKind::Directory => Side::Directory,
            EntryKind::Symlink | EntryKind::Other => Side::Special,
        }
    }
}

/// State of a source entry as the mirror sees it
///
/// A link to a regular file reports the target's state. Any other link is
/// returned as a link.
pub(crate) fn source_state(fs: &dyn IMirrorFileSystem, path: &Path) -> anyhow::Result<EntryState> {
    let state = fs.stat(path)?;
    if state.kind != EntryKind::Symlink {
        return Ok(state);
    }
    let target = fs.stat_followed(path)?;
    if target.is_regular_file() {
        Ok(target)
    } else {
        Ok(state)
    }
}

/// Why a source entry that is neither a file nor a directory is skipped
fn skip_reason(fs: &dyn IMirrorFileSystem, path: &Path, state: &EntryState) -> SkipReason {
    if state.kind != EntryKind::Symlink {
        return SkipReason::SpecialFile;
    }
    match fs.stat_followed(path).map(|target| target.kind) {
        Ok(EntryKind::Directory) => SkipReason::DirectoryLink,
        Ok(EntryKind::Missing) => SkipReason::DanglingLink,
        _ => SkipReason::SpecialFile,
    }
}

/// Computes [`ComparisonResult`]s through the filesystem port
#[derive(Clone)]
pub struct TreeComparator {
    fs: Arc<dyn IMirrorFileSystem>,
}

impl TreeComparator {
    pub fn new(fs: Arc<dyn IMirrorFileSystem>) -> Self {
        Self { fs }
    }

    /// Partition the children of `src` and `dst`
    ///
    /// Both paths must be existing directories.
    ///
    /// # Errors
    /// Returns [`MirrorError::Access`] if either directory cannot be listed.
    /// Failures on individual children do not fail the comparison; those
    /// names are reported in [`ComparisonResult::unreadable`].
    pub fn compare(&self, src: &Path, dst: &Path) -> Result<ComparisonResult, MirrorError> {
        let src_names: BTreeSet<OsString> = self
            .fs
            .list_dir(src)
            .map_err(|e| MirrorError::access(src, &e))?
            .into_iter()
            .collect();
        let dst_names: BTreeSet<OsString> = self
            .fs
            .list_dir(dst)
            .map_err(|e| MirrorError::access(dst, &e))?
            .into_iter()
            .collect();

        let mut result = ComparisonResult::new();

        for name in src_names.union(&dst_names) {
            let src_state = if src_names.contains(name) {
                source_state(self.fs.as_ref(), &src.join(name))
            } else {
                Ok(EntryState::not_found())
            };
            let dst_state = self.state_of(dst, name, dst_names.contains(name));

            let (src_state, dst_state) = match (src_state, dst_state) {
                (Ok(s), Ok(d)) => (s, d),
                (Err(e), _) | (_, Err(e)) => {
                    debug!(name = ?name, error = %format!("{e:#}"), "cannot stat entry");
                    result.unreadable.insert(name.clone(), format!("{e:#}"));
                    continue;
                }
            };

            // Skipped source entries count as absent; anything in the
            // replica counts as present.
            let source_side = match Side::of(&src_state) {
                Side::Special => {
                    let reason = skip_reason(self.fs.as_ref(), &src.join(name), &src_state);
                    trace!(name = ?name, %reason, "skipping source entry");
                    result.skipped.insert(name.clone(), reason);
                    Side::Absent
                }
                side => side,
            };
            let replica_side = Side::of(&dst_state);

            match (source_side, replica_side) {
                (Side::Absent, Side::Absent) => {}
                (Side::Absent, _) => {
                    result.right_only.insert(name.clone());
                }
                (_, Side::Absent) => {
                    result.left_only.insert(name.clone());
                }
                (Side::Directory, Side::Directory) => {
                    result.common_dirs.insert(name.clone());
                }
                (Side::File, Side::File) => {
                    match self.files_differ(&src.join(name), &src_state, &dst.join(name), &dst_state)
                    {
                        Ok(true) => {
                            result.diff_files.insert(name.clone());
                        }
                        Ok(false) => {}
                        Err(e) => {
                            result.unreadable.insert(name.clone(), format!("{e:#}"));
                        }
                    }
                }
                _ => {
                    result.type_mismatch.insert(name.clone());
                }
            }
        }

        debug!(
            src = %src.display(),
            common_dirs = result.common_dirs.len(),
            left_only = result.left_only.len(),
            right_only = result.right_only.len(),
            diff_files = result.diff_files.len(),
            type_mismatch = result.type_mismatch.len(),
            unreadable = result.unreadable.len(),
            skipped = result.skipped.len(),
            "Compared directory pair"
        );

        Ok(result)
    }

    /// Stats a listed child; unlisted names are absent without a syscall
    fn state_of(&self, dir: &Path, name: &OsString, listed: bool) -> anyhow::Result<EntryState> {
        if listed {
            self.fs.stat(&dir.join(name))
        } else {
            Ok(EntryState::not_found())
        }
    }

    /// Shallow comparison with a byte-level fallback
    fn files_differ(
        &self,
        src: &Path,
        src_state: &EntryState,
        dst: &Path,
        dst_state: &EntryState,
    ) -> anyhow::Result<bool> {
        if src_state.size != dst_state.size {
            return Ok(true);
        }
        if src_state.modified.is_some() && src_state.modified == dst_state.modified {
            return Ok(false);
        }
        Ok(!self.fs.contents_equal(src, dst)?)
    }
}

impl std::fmt::Debug for TreeComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeComparator").finish_non_exhaustive()
    }
}
