//! Directory handles for the mirror roots
//!
//! A [`DirectoryHandle`] names one of the two root directories (source or
//! replica). The path is resolved to an absolute, lexically normalized form
//! exactly once when the handle is created. Existence is never cached: the
//! directory may be deleted and recreated many times during reconciliation,
//! and [`DirectoryHandle::exists`] always asks the filesystem.

use std::{
    fmt::{self, Display, Formatter},
    path::{Component, Path, PathBuf},
};

use serde::Serialize;

use super::errors::DomainError;

/// Absolute path to a directory the mirroring engine operates on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DirectoryHandle(PathBuf);

impl DirectoryHandle {
    /// Create a handle from an absolute path
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is relative or if a
    /// `..` component would climb above the filesystem root.
    pub fn new(path: PathBuf) -> Result<Self, DomainError> {
        if !path.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Path must be absolute: {}",
                path.display()
            )));
        }

        // Lexical normalization only; the directory may not exist yet.
        let normalized = Self::normalize_path(&path)?;
        Ok(Self(normalized))
    }

    /// Resolve a configured path against a base directory
    ///
    /// Absolute paths are taken as-is; relative paths are anchored at `base`.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the combined path is not
    /// absolute (i.e. `base` itself was relative) or escapes the root.
    pub fn resolve(configured: &Path, base: &Path) -> Result<Self, DomainError> {
        if configured.is_absolute() {
            Self::new(configured.to_path_buf())
        } else {
            Self::new(base.join(configured))
        }
    }

    /// Get the absolute path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Convert to owned PathBuf
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Whether a directory currently exists at this path
    ///
    /// Derived from the filesystem on every call.
    pub fn exists(&self) -> bool {
        self.0.is_dir()
    }

    /// Normalize a path by resolving `.` and `..` components
    fn normalize_path(path: &Path) -> Result<PathBuf, DomainError> {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::Prefix(p) => normalized.push(p.as_os_str()),
                Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(DomainError::InvalidPath(
                            "Path escapes root via ..".to_string(),
                        ));
                    }
                }
                Component::Normal(c) => normalized.push(c),
            }
        }

        Ok(normalized)
    }
}

impl Display for DirectoryHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for DirectoryHandle {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
