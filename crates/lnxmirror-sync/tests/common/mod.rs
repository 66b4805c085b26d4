//! Shared fixtures for the mirror integration tests

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashSet},
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use filetime::FileTime;
use lnxmirror_core::{
    domain::{DirectoryHandle, Operation, OperationKind},
    ports::{
        filesystem::{EntryState, IMirrorFileSystem, SkippedEntry},
        operation_sink::IOperationSink,
    },
};
use lnxmirror_sync::{LocalFileSystemAdapter, Reconciler};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// RecordingSink
// ============================================================================

/// Sink that keeps every operation it is notified of
#[derive(Default)]
pub struct RecordingSink {
    ops: Mutex<Vec<Operation>>,
}

impl RecordingSink {
    pub fn operations(&self) -> Vec<Operation> {
        self.ops.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<OperationKind> {
        self.operations().iter().map(|o| o.kind()).collect()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }
}

impl IOperationSink for RecordingSink {
    fn notify(&self, operation: &Operation) {
        self.ops.lock().unwrap().push(operation.clone());
    }
}

// ============================================================================
// FaultyFileSystem
// ============================================================================

/// Real filesystem that refuses to mutate selected paths
#[derive(Default)]
pub struct FaultyFileSystem {
    inner: LocalFileSystemAdapter,
    failing: Mutex<HashSet<PathBuf>>,
}

impl FaultyFileSystem {
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn check(&self, path: &Path) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(path) {
            anyhow::bail!("injected failure");
        }
        Ok(())
    }
}

impl IMirrorFileSystem for FaultyFileSystem {
    fn list_dir(&self, path: &Path) -> anyhow::Result<Vec<OsString>> {
        self.inner.list_dir(path)
    }

    fn stat(&self, path: &Path) -> anyhow::Result<EntryState> {
        self.inner.stat(path)
    }

    fn stat_followed(&self, path: &Path) -> anyhow::Result<EntryState> {
        self.inner.stat_followed(path)
    }

    fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        self.check(path)?;
        self.inner.create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        self.check(path)?;
        self.inner.remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> anyhow::Result<()> {
        self.check(path)?;
        self.inner.remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        self.check(path)?;
        self.inner.remove_dir_all(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        self.check(dst)?;
        self.inner.copy_file(src, dst)
    }

    fn copy_dir_all(&self, src: &Path, dst: &Path) -> anyhow::Result<Vec<SkippedEntry>> {
        self.check(dst)?;
        self.inner.copy_dir_all(src, dst)
    }

    fn contents_equal(&self, a: &Path, b: &Path) -> anyhow::Result<bool> {
        self.inner.contents_equal(a, b)
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// A temp directory holding `source/` and `replica/` roots
pub struct Fixture {
    pub tmp: TempDir,
    pub source: DirectoryHandle,
    pub replica: DirectoryHandle,
    pub sink: Arc<RecordingSink>,
    pub reconciler: Reconciler,
}

impl Fixture {
    /// Both roots exist and are empty
    pub fn new() -> Self {
        Self::with_fs(Arc::new(LocalFileSystemAdapter::new()))
    }

    pub fn with_fs(fs_port: Arc<dyn IMirrorFileSystem>) -> Self {
        let tmp = TempDir::new().unwrap();
        let source = DirectoryHandle::new(tmp.path().join("source")).unwrap();
        let replica = DirectoryHandle::new(tmp.path().join("replica")).unwrap();
        fs::create_dir_all(source.path()).unwrap();
        fs::create_dir_all(replica.path()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let reconciler = Reconciler::new(fs_port, sink.clone());
        Self {
            tmp,
            source,
            replica,
            sink,
            reconciler,
        }
    }

    pub fn src(&self, rel: &str) -> PathBuf {
        self.source.path().join(rel)
    }

    pub fn dst(&self, rel: &str) -> PathBuf {
        self.replica.path().join(rel)
    }

    pub fn mirror(&self) -> lnxmirror_sync::MirrorReport {
        self.reconciler.mirror(&self.source, &self.replica)
    }
}

/// Writes `content` at `path` (creating parents) with a fixed mtime
pub fn write_file(path: &Path, content: &[u8], mtime: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

/// Relative path -> file content (`None` for directories)
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    let mut tree = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
        if entry.file_type().is_dir() {
            tree.insert(rel, None);
        } else if entry.file_type().is_file() {
            tree.insert(rel, Some(fs::read(entry.path()).unwrap()));
        }
    }
    tree
}
