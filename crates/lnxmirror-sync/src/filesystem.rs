//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`IMirrorFileSystem`] using blocking `std::fs` calls.
//!
//! ## Design Decisions
//!
//! - **Blocking I/O**: a mirror pass is one synchronous depth-first walk, so
//!   the adapter never touches the async runtime.
//! - **mtime preservation**: copies restore the source modification time with
//!   `filetime`, which is what lets the next comparison see the pair as equal.
//! - **Links**: `stat` uses `symlink_metadata`; `stat_followed` looks at
//!   the target. `copy_dir_all` copies links to regular files as files and
//!   skips (and returns) every other link, so a walk never enters a cycle.

use std::{
    ffi::OsString,
    fs::{self, File, Metadata},
    io::{ErrorKind, Read},
    path::Path,
};

use anyhow::Context;
use chrono::DateTime;
use filetime::FileTime;
use lnxmirror_core::{
    domain::SkipReason,
    ports::filesystem::{EntryKind, EntryState, IMirrorFileSystem, SkippedEntry},
};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Read size used when comparing file contents
const COMPARE_CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`IMirrorFileSystem`] port to the real filesystem.
///
/// This is a zero-sized struct because all operations derive their context
/// from the path arguments. The mirror roots live at a higher layer.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Converts metadata (of a link or of its target) into an [`EntryState`]
fn state_from(metadata: &Metadata) -> EntryState {
    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };

    let size = if kind == EntryKind::File {
        metadata.len()
    } else {
        0
    };

    // Convert system modified time to DateTime<Utc>.
    let modified = metadata.modified().ok().and_then(|st| {
        st.duration_since(std::time::UNIX_EPOCH)
            .ok()
            .and_then(|dur| DateTime::from_timestamp(dur.as_secs() as i64, dur.subsec_nanos()))
    });

    EntryState {
        kind,
        size,
        modified,
    }
}

/// Fills `buf` from `reader` until it is full or the reader hits EOF
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ============================================================================
// IMirrorFileSystem implementation
// ============================================================================

impl IMirrorFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn list_dir(&self, path: &Path) -> anyhow::Result<Vec<OsString>> {
        let mut names = Vec::new();
        let entries = fs::read_dir(path)
            .with_context(|| format!("failed to list directory {}", path.display()))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", path.display()))?;
            names.push(entry.file_name());
        }
        debug!(entries = names.len(), "directory listed");
        Ok(names)
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn stat(&self, path: &Path) -> anyhow::Result<EntryState> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("path not found");
                return Ok(EntryState::not_found());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to stat {}", path.display()))
            }
        };

        Ok(state_from(&metadata))
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn stat_followed(&self, path: &Path) -> anyhow::Result<EntryState> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(state_from(&metadata)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("link target not found");
                Ok(EntryState::not_found())
            }
            Err(e) => Err(e).with_context(|| format!("failed to stat target of {}", path.display())),
        }
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
        debug!("directory created");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove file {}", path.display()))?;
        debug!("file removed");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn remove_dir(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_dir(path)
            .with_context(|| format!("failed to remove directory {}", path.display()))?;
        debug!("directory removed");
        Ok(())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory tree {}", path.display()))?;
        debug!("directory tree removed");
        Ok(())
    }

    #[instrument(skip(self, src, dst), fields(src = %src.display(), dst = %dst.display()))]
    fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        let bytes = fs::copy(src, dst).with_context(|| {
            format!("failed to copy {} to {}", src.display(), dst.display())
        })?;

        let metadata = fs::metadata(src)
            .with_context(|| format!("failed to read metadata of {}", src.display()))?;
        let mtime = FileTime::from_last_modification_time(&metadata);
        filetime::set_file_mtime(dst, mtime).with_context(|| {
            format!("failed to set modification time on {}", dst.display())
        })?;

        debug!(bytes, "file copied");
        Ok(())
    }

    #[instrument(skip(self, src, dst), fields(src = %src.display(), dst = %dst.display()))]
    fn copy_dir_all(&self, src: &Path, dst: &Path) -> anyhow::Result<Vec<SkippedEntry>> {
        let mut files = 0u64;
        let mut skipped = Vec::new();
        for entry in WalkDir::new(src).follow_links(false) {
            let entry = entry
                .with_context(|| format!("failed to traverse {} while copying", src.display()))?;
            let relative = entry.path().strip_prefix(src).with_context(|| {
                format!(
                    "failed to strip prefix {} from {}",
                    src.display(),
                    entry.path().display()
                )
            })?;
            let target = dst.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&target).with_context(|| {
                    format!("failed to create directory {}", target.display())
                })?;
            } else if file_type.is_file() {
                self.copy_file(entry.path(), &target)?;
                files += 1;
            } else {
                let reason = if file_type.is_symlink() {
                    match self.stat_followed(entry.path())?.kind {
                        EntryKind::File => {
                            self.copy_file(entry.path(), &target)?;
                            files += 1;
                            continue;
                        }
                        EntryKind::Directory => SkipReason::DirectoryLink,
                        EntryKind::Missing => SkipReason::DanglingLink,
                        EntryKind::Symlink | EntryKind::Other => SkipReason::SpecialFile,
                    }
                } else {
                    SkipReason::SpecialFile
                };
                debug!(path = %entry.path().display(), %reason, "skipping entry");
                skipped.push(SkippedEntry {
                    path: entry.path().to_path_buf(),
                    reason,
                });
            }
        }

        debug!(files, skipped = skipped.len(), "directory tree copied");
        Ok(skipped)
    }

    #[instrument(skip(self, a, b), fields(a = %a.display(), b = %b.display()))]
    fn contents_equal(&self, a: &Path, b: &Path) -> anyhow::Result<bool> {
        let mut file_a =
            File::open(a).with_context(|| format!("failed to open {}", a.display()))?;
        let mut file_b =
            File::open(b).with_context(|| format!("failed to open {}", b.display()))?;

        let mut buf_a = vec![0u8; COMPARE_CHUNK_SIZE];
        let mut buf_b = vec![0u8; COMPARE_CHUNK_SIZE];

        loop {
            let read_a = read_chunk(&mut file_a, &mut buf_a)
                .with_context(|| format!("failed to read {}", a.display()))?;
            let read_b = read_chunk(&mut file_b, &mut buf_b)
                .with_context(|| format!("failed to read {}", b.display()))?;

            if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
                debug!("contents differ");
                return Ok(false);
            }
            if read_a == 0 {
                return Ok(true);
            }
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
