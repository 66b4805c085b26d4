//! OperationLog - append-only operation log file
//!
//! Writes one line per [`Operation`] using [`Operation::log_line`]. All
//! writes are non-fatal: I/O errors are logged via `tracing::warn!` but never
//! propagated, so a full disk or a removed log directory never interrupts a
//! mirror pass.

use std::{
    collections::VecDeque,
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;
use lnxmirror_core::{domain::Operation, ports::operation_sink::IOperationSink};

/// Append-only log of mirror operations backed by a plain-text file.
pub struct OperationLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl OperationLog {
    /// Opens (creating if needed) the log file at `path` for appending.
    ///
    /// Missing parent directories are created. With `truncate` set the file
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>, truncate: bool) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options
            .open(&path)
            .with_context(|| format!("failed to open operation log {}", path.display()))?;

        tracing::debug!(path = %path.display(), truncate, "Operation log opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single line, swallowing errors with a tracing warning.
    fn append(&self, line: &str) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}").and_then(|()| file.flush()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write operation log");
        }
    }
}

impl IOperationSink for OperationLog {
    fn notify(&self, operation: &Operation) {
        self.append(&operation.log_line());
    }
}

impl std::fmt::Debug for OperationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Reads the last `lines` lines of an operation log
///
/// A missing file yields an empty list.
pub fn read_tail(path: &Path, lines: usize) -> anyhow::Result<Vec<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to open operation log {}", path.display()))
        }
    };

    let mut tail = VecDeque::with_capacity(lines.min(1024));
    for line in BufReader::new(file).lines() {
        let line =
            line.with_context(|| format!("failed to read operation log {}", path.display()))?;
        if lines == 0 {
            continue;
        }
        if tail.len() == lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Ok(tail.into())
}
