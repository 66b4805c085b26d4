//! Operation records emitted by the mirroring engine
//!
//! Every filesystem mutation performed by the reconciler (and every failed
//! attempt) is described by exactly one [`Operation`]. Operations are
//! ephemeral: they are built, handed to an
//! [`IOperationSink`](crate::ports::IOperationSink) and dropped.
//!
//! ## Log line format
//!
//! ```text
//! [ COPY   ]  2024-05-01 12:00:00  FILE /src/a.txt TO /replica/a.txt
//! [ DELETE ]  2024-05-01 12:00:00  DIR  /replica/old
//! [ ERROR  ]  2024-05-01 12:00:00  FILE /replica/locked.txt - Permission denied
//! ```

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use serde::Serialize;

/// Timestamp format used in the operation log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of filesystem operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// An entry present only in the source was copied to the replica
    Copy,
    /// An entry present only in the replica was removed
    Delete,
    /// A replica entry was overwritten with the source version
    Update,
    /// A missing directory was created
    Create,
    /// Something unusual that did not prevent the operation
    Warning,
    /// A filesystem operation failed and was skipped
    Error,
}

impl OperationKind {
    /// All kinds, in display order
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Copy,
        OperationKind::Delete,
        OperationKind::Update,
        OperationKind::Create,
        OperationKind::Warning,
        OperationKind::Error,
    ];

    /// Fixed-width bracketed tag written at the start of each log line
    pub fn tag(self) -> &'static str {
        match self {
            OperationKind::Copy => "[ COPY   ]",
            OperationKind::Delete => "[ DELETE ]",
            OperationKind::Update => "[ UPDATE ]",
            OperationKind::Create => "[ CREATE ]",
            OperationKind::Warning => "[ WARN   ]",
            OperationKind::Error => "[ ERROR  ]",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::Copy => "copy",
            OperationKind::Delete => "delete",
            OperationKind::Update => "update",
            OperationKind::Create => "create",
            OperationKind::Warning => "warning",
            OperationKind::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Whether an operation concerns a file or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    File,
    Directory,
}

impl EntryType {
    /// Four-character label used in log lines (`FILE` or `DIR `)
    pub fn label(self) -> &'static str {
        match self {
            EntryType::File => "FILE",
            EntryType::Directory => "DIR ",
        }
    }

    pub fn is_file(self) -> bool {
        matches!(self, EntryType::File)
    }
}

/// A single filesystem action taken (or attempted) by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    kind: OperationKind,
    timestamp: DateTime<Local>,
    source: PathBuf,
    destination: Option<PathBuf>,
    entry_type: EntryType,
    /// Failure reason for `Warning`/`Error` operations
    detail: Option<String>,
}

impl Operation {
    /// Creates an operation stamped with the current local time
    pub fn new(
        kind: OperationKind,
        source: impl Into<PathBuf>,
        destination: Option<PathBuf>,
        entry_type: EntryType,
    ) -> Self {
        Self {
            kind,
            timestamp: Local::now(),
            source: source.into(),
            destination,
            entry_type,
            detail: None,
        }
    }

    /// `Copy` of a source-only entry into the replica
    pub fn copy(source: &Path, destination: &Path, entry_type: EntryType) -> Self {
        Self::new(
            OperationKind::Copy,
            source,
            Some(destination.to_path_buf()),
            entry_type,
        )
    }

    /// `Update` of a replica entry from its source counterpart
    pub fn update(source: &Path, destination: &Path, entry_type: EntryType) -> Self {
        Self::new(
            OperationKind::Update,
            source,
            Some(destination.to_path_buf()),
            entry_type,
        )
    }

    /// `Delete` of a replica entry
    pub fn delete(path: &Path, entry_type: EntryType) -> Self {
        Self::new(OperationKind::Delete, path, None, entry_type)
    }

    /// `Create` of a directory
    pub fn create(path: &Path) -> Self {
        Self::new(OperationKind::Create, path, None, EntryType::Directory)
    }

    /// `Warning` about a path
    pub fn warning(path: &Path, entry_type: EntryType, detail: impl Into<String>) -> Self {
        Self::new(OperationKind::Warning, path, None, entry_type).with_detail(detail)
    }

    /// `Error` for a failed filesystem operation on a path
    pub fn error(path: &Path, entry_type: EntryType, detail: impl Into<String>) -> Self {
        Self::new(OperationKind::Error, path, None, entry_type).with_detail(detail)
    }

    /// Attaches a detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Overrides the timestamp (useful for deterministic output)
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Renders everything after the tag: timestamp, entry type, paths, detail
    ///
    /// Shared by the plain log line and by colored console output, which
    /// only differ in how the tag is printed.
    pub fn body(&self) -> String {
        let mut body = format!(
            "{}  {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.entry_type.label(),
            self.source.display()
        );
        if let Some(destination) = &self.destination {
            body.push_str(" TO ");
            body.push_str(&destination.display().to_string());
        }
        if let Some(detail) = &self.detail {
            body.push_str(" - ");
            body.push_str(detail);
        }
        body
    }

    /// One line of the append-only operation log (without trailing newline)
    pub fn log_line(&self) -> String {
        format!("{}  {}", self.kind.tag(), self.body())
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.log_line())
    }
}
