//! Mirror pass (reconciliation)
//!
//! The [`Reconciler`] makes a replica tree match its source tree. A pass is a
//! synchronous depth-first walk over each directory pair:
//!
//! 1. **Sanitize** - handle missing roots (create the replica, cascade-delete
//!    it when the source is gone, or do nothing when both are missing).
//! 2. **Compare** - partition the children with [`TreeComparator`].
//! 3. **Recurse** - into every common subdirectory, in sorted order.
//! 4. **Copy** - entries present only in the source.
//! 5. **Delete** - entries present only in the replica.
//! 6. **Update** - differing files and type mismatches, source always wins.
//!
//! Every mutation is followed by exactly one operation notification. Every
//! failed mutation produces exactly one `Error` notification and is recorded
//! in the [`MirrorReport`]; it never stops the rest of the pass.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use lnxmirror_core::{
    domain::{DirectoryHandle, EntryType, Operation, SkipReason},
    ports::{
        filesystem::{EntryKind, EntryState, IMirrorFileSystem},
        operation_sink::IOperationSink,
    },
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    comparator::{source_state, TreeComparator},
    MirrorError,
};

// ============================================================================
// MirrorReport
// ============================================================================

/// What happened to the root pair during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Both roots existed (or the replica was created) and were reconciled
    Mirrored,
    /// The source was missing, so the replica was removed
    ReplicaRemoved,
    /// Neither root exists
    NothingToMirror,
    /// The root pair could not be reconciled at all
    Failed,
}

impl std::fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PassOutcome::Mirrored => "mirrored",
            PassOutcome::ReplicaRemoved => "replica removed",
            PassOutcome::NothingToMirror => "nothing to mirror",
            PassOutcome::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Summary of a completed mirror pass
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    /// Outcome for the root pair
    pub outcome: PassOutcome,
    /// Directories created
    pub created: u32,
    /// Entries copied from source-only
    pub copied: u32,
    /// Replica entries overwritten from the source
    pub updated: u32,
    /// Replica entries removed
    pub deleted: u32,
    /// Differing files whose source copy was strictly newer
    pub src_newer: Vec<PathBuf>,
    /// Differing files whose replica copy was newer or equally old
    pub dst_newer: Vec<PathBuf>,
    /// Source entries left out: links to directories, dangling links and
    /// special files. Each one is reported as a `Warning` operation.
    pub skipped: Vec<PathBuf>,
    /// Errors encountered during the pass (non-fatal)
    pub errors: Vec<String>,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl MirrorReport {
    fn new() -> Self {
        Self {
            outcome: PassOutcome::Mirrored,
            created: 0,
            copied: 0,
            updated: 0,
            deleted: 0,
            src_newer: Vec::new(),
            dst_newer: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Total number of successful mutations
    pub fn mutations(&self) -> u32 {
        self.created + self.copied + self.updated + self.deleted
    }

    /// True if the pass changed nothing and hit no errors
    pub fn is_noop(&self) -> bool {
        self.mutations() == 0 && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Applies copy/delete/update operations so the replica mirrors the source
#[derive(Clone)]
pub struct Reconciler {
    fs: Arc<dyn IMirrorFileSystem>,
    sink: Arc<dyn IOperationSink>,
    comparator: TreeComparator,
}

impl Reconciler {
    pub fn new(fs: Arc<dyn IMirrorFileSystem>, sink: Arc<dyn IOperationSink>) -> Self {
        let comparator = TreeComparator::new(Arc::clone(&fs));
        Self {
            fs,
            sink,
            comparator,
        }
    }

    /// Run one full mirror pass from `source` onto `replica`
    ///
    /// Never fails: every problem is reported as an `Error` operation and
    /// collected in [`MirrorReport::errors`].
    pub fn mirror(&self, source: &DirectoryHandle, replica: &DirectoryHandle) -> MirrorReport {
        let start = Instant::now();
        let mut report = MirrorReport::new();

        debug!(source = %source, replica = %replica, "Starting mirror pass");

        report.outcome = self.mirror_pair(source.path(), replica.path(), &mut report);
        report.duration_ms = start.elapsed().as_millis() as u64;

        if report.is_noop() {
            debug!(outcome = %report.outcome, duration_ms = report.duration_ms, "Replica up to date");
        } else {
            info!(
                outcome = %report.outcome,
                created = report.created,
                copied = report.copied,
                updated = report.updated,
                deleted = report.deleted,
                errors = report.errors.len(),
                duration_ms = report.duration_ms,
                "Mirror pass complete"
            );
        }

        report
    }

    /// Sanitize a pair and reconcile it if both sides are usable
    fn mirror_pair(&self, src: &Path, dst: &Path, report: &mut MirrorReport) -> PassOutcome {
        match self.sanitize(src, dst, report) {
            Ok(()) => {
                self.reconcile(src, dst, report);
                PassOutcome::Mirrored
            }
            Err(MirrorError::MissingBoth(path)) => {
                trace!(path = %path.display(), "Source and replica both missing, skipping");
                PassOutcome::NothingToMirror
            }
            Err(MirrorError::MissingSource(path)) => {
                debug!(source = %path.display(), replica = %dst.display(), "Source missing, removing replica");
                self.cascade_delete(dst, report);
                PassOutcome::ReplicaRemoved
            }
            Err(_) => PassOutcome::Failed,
        }
    }

    // ------------------------------------------------------------------------
    // Step 1: sanitize
    // ------------------------------------------------------------------------

    /// Bring the pair into a state where it can be compared
    ///
    /// Returns `MissingBoth`/`MissingSource` for the terminal cases. Any
    /// other error has already been reported to the sink.
    fn sanitize(&self, src: &Path, dst: &Path, report: &mut MirrorReport) -> Result<(), MirrorError> {
        let src_state = self.stat_or_report(src, EntryType::Directory, report)?;
        let dst_state = self.stat_or_report(dst, EntryType::Directory, report)?;

        if src_state.exists() && !src_state.is_directory() {
            return Err(self.refuse(src, "source is not a directory", report));
        }
        if dst_state.exists() && !dst_state.is_directory() {
            return Err(self.refuse(dst, "replica is not a directory", report));
        }

        match (src_state.exists(), dst_state.exists()) {
            (false, false) => Err(MirrorError::MissingBoth(dst.to_path_buf())),
            (false, true) => Err(MirrorError::MissingSource(src.to_path_buf())),
            (true, false) => match self.fs.create_dir_all(dst) {
                Ok(()) => {
                    self.sink.notify(&Operation::create(dst));
                    report.created += 1;
                    Ok(())
                }
                Err(e) => {
                    self.record_failure(dst, EntryType::Directory, &e, report);
                    Err(MirrorError::access(dst, &e))
                }
            },
            (true, true) => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Steps 2-6: compare, recurse, apply
    // ------------------------------------------------------------------------

    fn reconcile(&self, src: &Path, dst: &Path, report: &mut MirrorReport) {
        let comparison = match self.comparator.compare(src, dst) {
            Ok(c) => c,
            Err(e) => {
                self.record_mirror_error(&e, EntryType::Directory, report);
                return;
            }
        };

        if comparison.is_settled() {
            trace!(dir = %src.display(), "Level already mirrored");
        }

        for name in &comparison.common_dirs {
            self.mirror_pair(&src.join(name), &dst.join(name), report);
        }

        for name in &comparison.left_only {
            self.copy_entry(&src.join(name), &dst.join(name), report);
        }

        for name in &comparison.right_only {
            self.delete_entry(&dst.join(name), report);
        }

        if !comparison.diff_files.is_empty() {
            self.update_files(src, dst, &comparison.diff_files, report);
        }

        for name in &comparison.type_mismatch {
            self.replace_entry(&src.join(name), &dst.join(name), report);
        }

        for (name, reason) in &comparison.unreadable {
            let path = dst.join(name);
            warn!(path = %path.display(), reason = %reason, "Skipping unreadable entry");
            self.sink
                .notify(&Operation::error(&path, EntryType::File, reason.clone()));
            report.errors.push(format!("{}: {}", path.display(), reason));
        }

        for (name, reason) in &comparison.skipped {
            self.report_skipped(&src.join(name), *reason, report);
        }
    }

    /// Step 4: copy a source-only entry into the replica
    fn copy_entry(&self, src: &Path, dst: &Path, report: &mut MirrorReport) {
        let Ok(state) = self.source_state_or_report(src, report) else {
            return;
        };
        let entry_type = entry_type_of(&state);

        let result = match state.kind {
            EntryKind::Directory => self.fs.copy_dir_all(src, dst),
            EntryKind::File => self.fs.copy_file(src, dst).map(|()| Vec::new()),
            // Vanished since the comparison, or turned into a link.
            _ => {
                trace!(path = %src.display(), "Source entry no longer copyable, skipping");
                return;
            }
        };

        match result {
            Ok(skipped) => {
                self.sink.notify(&Operation::copy(src, dst, entry_type));
                report.copied += 1;
                for entry in skipped {
                    self.report_skipped(&entry.path, entry.reason, report);
                }
            }
            Err(e) => self.record_failure(src, entry_type, &e, report),
        }
    }

    /// Step 5: remove a replica-only entry
    fn delete_entry(&self, dst: &Path, report: &mut MirrorReport) {
        let Ok(state) = self.stat_or_report(dst, EntryType::File, report) else {
            return;
        };
        if !state.exists() {
            return;
        }
        let entry_type = entry_type_of(&state);

        match self.remove(dst, &state) {
            Ok(()) => {
                self.sink.notify(&Operation::delete(dst, entry_type));
                report.deleted += 1;
            }
            Err(e) => self.record_failure(dst, entry_type, &e, report),
        }
    }

    /// Step 6: overwrite differing files from the source
    ///
    /// The newer/older split only feeds logging and the report; the source
    /// copy is written in both cases.
    fn update_files(
        &self,
        src: &Path,
        dst: &Path,
        names: &std::collections::BTreeSet<std::ffi::OsString>,
        report: &mut MirrorReport,
    ) {
        let mut src_newer = Vec::new();
        let mut dst_newer = Vec::new();

        for name in names {
            let src_path = src.join(name);
            let dst_path = dst.join(name);
            let src_mtime = source_state(self.fs.as_ref(), &src_path)
                .ok()
                .and_then(|s| s.modified);
            let dst_mtime = self.fs.stat(&dst_path).ok().and_then(|s| s.modified);
            if src_mtime > dst_mtime {
                src_newer.push(src_path);
            } else {
                dst_newer.push(src_path);
            }
        }

        debug!(
            dir = %src.display(),
            src_newer = src_newer.len(),
            dst_newer = dst_newer.len(),
            "Resolving differing files"
        );

        for src_path in src_newer.iter().chain(dst_newer.iter()) {
            let Some(name) = src_path.file_name() else {
                continue;
            };
            let dst_path = dst.join(name);
            match self.fs.copy_file(src_path, &dst_path) {
                Ok(()) => {
                    self.sink
                        .notify(&Operation::update(src_path, &dst_path, EntryType::File));
                    report.updated += 1;
                }
                Err(e) => self.record_failure(&dst_path, EntryType::File, &e, report),
            }
        }

        report.src_newer.extend(src_newer);
        report.dst_newer.extend(dst_newer);
    }

    /// Step 6: replace a replica entry whose type differs from the source's
    fn replace_entry(&self, src: &Path, dst: &Path, report: &mut MirrorReport) {
        let Ok(src_state) = self.source_state_or_report(src, report) else {
            return;
        };
        let Ok(dst_state) = self.stat_or_report(dst, EntryType::File, report) else {
            return;
        };
        let entry_type = entry_type_of(&src_state);

        if dst_state.exists() {
            if let Err(e) = self.remove(dst, &dst_state) {
                self.record_failure(dst, entry_type_of(&dst_state), &e, report);
                return;
            }
        }

        let result = match src_state.kind {
            EntryKind::Directory => self.fs.copy_dir_all(src, dst),
            EntryKind::File => self.fs.copy_file(src, dst).map(|()| Vec::new()),
            _ => return,
        };

        match result {
            Ok(skipped) => {
                self.sink.notify(&Operation::update(src, dst, entry_type));
                report.updated += 1;
                for entry in skipped {
                    self.report_skipped(&entry.path, entry.reason, report);
                }
            }
            Err(e) => self.record_failure(dst, entry_type, &e, report),
        }
    }

    // ------------------------------------------------------------------------
    // Missing-source cascade
    // ------------------------------------------------------------------------

    /// Delete every direct entry under `dst`, then `dst` itself
    fn cascade_delete(&self, dst: &Path, report: &mut MirrorReport) {
        let mut names = match self.fs.list_dir(dst) {
            Ok(names) => names,
            Err(e) => {
                self.record_failure(dst, EntryType::Directory, &e, report);
                return;
            }
        };
        names.sort();

        for name in names {
            self.delete_entry(&dst.join(name), report);
        }

        match self.fs.remove_dir(dst) {
            Ok(()) => {
                self.sink.notify(&Operation::delete(dst, EntryType::Directory));
                report.deleted += 1;
            }
            Err(e) => self.record_failure(dst, EntryType::Directory, &e, report),
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn remove(&self, path: &Path, state: &EntryState) -> anyhow::Result<()> {
        if state.is_directory() {
            self.fs.remove_dir_all(path)
        } else {
            self.fs.remove_file(path)
        }
    }

    fn stat_or_report(
        &self,
        path: &Path,
        entry_type: EntryType,
        report: &mut MirrorReport,
    ) -> Result<EntryState, MirrorError> {
        self.fs.stat(path).map_err(|e| {
            self.record_failure(path, entry_type, &e, report);
            MirrorError::access(path, &e)
        })
    }

    /// Like [`stat_or_report`](Self::stat_or_report) but sees links to
    /// regular files as those files
    fn source_state_or_report(
        &self,
        path: &Path,
        report: &mut MirrorReport,
    ) -> Result<EntryState, MirrorError> {
        source_state(self.fs.as_ref(), path).map_err(|e| {
            self.record_failure(path, EntryType::File, &e, report);
            MirrorError::access(path, &e)
        })
    }

    /// Report a source entry that is not mirrored as one `Warning` operation
    fn report_skipped(&self, path: &Path, reason: SkipReason, report: &mut MirrorReport) {
        debug!(path = %path.display(), %reason, "Source entry not mirrored");
        self.sink
            .notify(&Operation::warning(path, EntryType::File, reason.to_string()));
        report.skipped.push(path.to_path_buf());
    }

    fn refuse(&self, path: &Path, reason: &str, report: &mut MirrorReport) -> MirrorError {
        warn!(path = %path.display(), reason, "Cannot mirror");
        self.sink
            .notify(&Operation::error(path, EntryType::Directory, reason));
        report.errors.push(format!("{}: {}", path.display(), reason));
        MirrorError::Access {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Report a failed filesystem call as one `Error` operation
    fn record_failure(
        &self,
        path: &Path,
        entry_type: EntryType,
        err: &anyhow::Error,
        report: &mut MirrorReport,
    ) {
        warn!(path = %path.display(), error = %format!("{err:#}"), "Filesystem operation failed");
        self.sink.notify(&Operation::error(
            path,
            entry_type,
            err.root_cause().to_string(),
        ));
        report.errors.push(format!("{err:#}"));
    }

    fn record_mirror_error(&self, err: &MirrorError, entry_type: EntryType, report: &mut MirrorReport) {
        if let MirrorError::Access { path, reason } = err {
            warn!(path = %path.display(), reason = %reason, "Cannot access directory");
            self.sink
                .notify(&Operation::error(path, entry_type, reason.clone()));
        }
        report.errors.push(err.to_string());
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

fn entry_type_of(state: &EntryState) -> EntryType {
    if state.is_directory() {
        EntryType::Directory
    } else {
        EntryType::File
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex};

    use filetime::FileTime;
    use lnxmirror_core::domain::OperationKind;
    use tempfile::TempDir;

    use super::*;
    use crate::filesystem::LocalFileSystemAdapter;

    #[derive(Default)]
    struct RecordingSink {
        ops: Mutex<Vec<Operation>>,
    }

    impl RecordingSink {
        fn kinds(&self) -> Vec<OperationKind> {
            self.ops.lock().unwrap().iter().map(|o| o.kind()).collect()
        }
    }

    impl IOperationSink for RecordingSink {
        fn notify(&self, operation: &Operation) {
            self.ops.lock().unwrap().push(operation.clone());
        }
    }

    fn setup() -> (TempDir, DirectoryHandle, DirectoryHandle, Reconciler, Arc<RecordingSink>) {
        let tmp = TempDir::new().unwrap();
        let src = DirectoryHandle::new(tmp.path().join("src")).unwrap();
        let dst = DirectoryHandle::new(tmp.path().join("dst")).unwrap();
        fs::create_dir_all(src.path()).unwrap();
        fs::create_dir_all(dst.path()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let reconciler = Reconciler::new(Arc::new(LocalFileSystemAdapter::new()), sink.clone());
        (tmp, src, dst, reconciler, sink)
    }

    fn write(path: &Path, content: &[u8], mtime: i64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        filetime::set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
    }

    #[test]
    fn test_report_counts_and_noop() {
        let (_tmp, src, dst, reconciler, _sink) = setup();
        let report = reconciler.mirror(&src, &dst);
        assert_eq!(report.outcome, PassOutcome::Mirrored);
        assert!(report.is_noop());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_newer_split_is_reported() {
        let (_tmp, src, dst, reconciler, sink) = setup();
        write(&src.path().join("fresh.txt"), b"new!", 2_000);
        write(&dst.path().join("fresh.txt"), b"old", 1_000);
        write(&src.path().join("stale.txt"), b"src", 1_000);
        write(&dst.path().join("stale.txt"), b"replica", 2_000);

        let report = reconciler.mirror(&src, &dst);

        assert_eq!(report.updated, 2);
        assert_eq!(report.src_newer, vec![src.path().join("fresh.txt")]);
        assert_eq!(report.dst_newer, vec![src.path().join("stale.txt")]);
        assert_eq!(sink.kinds(), vec![OperationKind::Update, OperationKind::Update]);
        assert_eq!(fs::read(dst.path().join("stale.txt")).unwrap(), b"src");
    }

    #[test]
    fn test_type_mismatch_replaced_from_source() {
        let (_tmp, src, dst, reconciler, sink) = setup();
        write(&src.path().join("thing/inner.txt"), b"inner", 1_000);
        write(&dst.path().join("thing"), b"was a file", 1_000);

        let report = reconciler.mirror(&src, &dst);

        assert_eq!(report.updated, 1);
        assert_eq!(sink.kinds(), vec![OperationKind::Update]);
        let op = sink.ops.lock().unwrap()[0].clone();
        assert_eq!(op.entry_type(), EntryType::Directory);
        assert!(dst.path().join("thing/inner.txt").is_file());
    }

    #[test]
    fn test_replica_file_at_root_is_refused() {
        let tmp = TempDir::new().unwrap();
        let src = DirectoryHandle::new(tmp.path().join("src")).unwrap();
        let dst = DirectoryHandle::new(tmp.path().join("dst")).unwrap();
        fs::create_dir_all(src.path()).unwrap();
        fs::write(dst.path(), b"not a dir").unwrap();
        let sink = Arc::new(RecordingSink::default());
        let reconciler = Reconciler::new(Arc::new(LocalFileSystemAdapter::new()), sink.clone());

        let report = reconciler.mirror(&src, &dst);

        assert_eq!(report.outcome, PassOutcome::Failed);
        assert_eq!(sink.kinds(), vec![OperationKind::Error]);
        assert_eq!(fs::read(dst.path()).unwrap(), b"not a dir");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(PassOutcome::ReplicaRemoved.to_string(), "replica removed");
        assert_eq!(PassOutcome::NothingToMirror.to_string(), "nothing to mirror");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let (_tmp, src, dst, reconciler, _sink) = setup();
        write(&src.path().join("a.txt"), b"a", 1_000);
        let report = reconciler.mirror(&src, &dst);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "mirrored");
        assert_eq!(json["copied"], 1);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
