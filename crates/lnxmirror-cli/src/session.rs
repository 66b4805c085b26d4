//! Wiring of a mirror session: sinks, resolver, reconciler
//!
//! Shared by `run` and `once`. Everything here happens once at startup; the
//! resulting [`MirrorSession`] only runs passes.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use lnxmirror_audit::{OperationLog, TracingSink};
use lnxmirror_core::{
    config::Config,
    domain::DirectoryHandle,
    ports::{
        filesystem::IMirrorFileSystem,
        operation_sink::{CompositeSink, IOperationSink},
    },
};
use lnxmirror_sync::{LocalFileSystemAdapter, MirrorReport, PathResolver, Reconciler};
use tracing::info;

use crate::output::{ConsoleSink, OutputFormat};

/// Resolved roots plus the reconciler that mirrors them
pub struct MirrorSession {
    pub source: DirectoryHandle,
    pub replica: DirectoryHandle,
    pub log_path: PathBuf,
    reconciler: Reconciler,
}

impl MirrorSession {
    /// Validate `config`, open the operation log and resolve both roots
    ///
    /// With `console` set, every operation is also printed to stdout in
    /// `format`.
    pub fn prepare(config: &Config, format: OutputFormat, console: bool) -> Result<Self> {
        config.ensure_valid()?;

        let base = base_dir(config)?;
        let log_path = anchor(&base, &config.log_file_path());
        let log = OperationLog::open(&log_path, config.logging.truncate_on_start)
            .context("Failed to open operation log")?;

        let mut sink = CompositeSink::new()
            .with_sink(Arc::new(log))
            .with_sink(Arc::new(TracingSink::new()));
        if console {
            sink = sink.with_sink(Arc::new(ConsoleSink::new(format)));
        }
        let sink: Arc<dyn IOperationSink> = Arc::new(sink);
        let fs: Arc<dyn IMirrorFileSystem> = Arc::new(LocalFileSystemAdapter::new());

        let resolver = PathResolver::new(base, Arc::clone(&fs), Arc::clone(&sink))?;
        if config.mirror.clean_replica_on_start {
            resolver.remove_tree(&config.mirror.replica)?;
        }
        let source = resolver.resolve(&config.mirror.source)?;
        let replica = resolver.resolve(&config.mirror.replica)?;

        info!(
            source = %source,
            replica = %replica,
            log = %log_path.display(),
            "Mirror session ready"
        );

        Ok(Self {
            source,
            replica,
            log_path,
            reconciler: Reconciler::new(fs, sink),
        })
    }

    /// Run one mirror pass
    pub fn mirror(&self) -> MirrorReport {
        self.reconciler.mirror(&self.source, &self.replica)
    }
}

/// Directory relative paths in `config` are anchored at
pub fn base_dir(config: &Config) -> Result<PathBuf> {
    config
        .anchor_dir()
        .context("Failed to determine the base directory for relative paths")
}

/// Operation log path with the base directory applied
pub fn log_path(config: &Config) -> Result<PathBuf> {
    Ok(anchor(&base_dir(config)?, &config.log_file_path()))
}

fn anchor(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
