//! Subcommands of the `lnxmirror` binary

pub mod config;
pub mod log;
pub mod once;
pub mod run;

use std::path::PathBuf;

use clap::Args;
use lnxmirror_core::config::{Config, ConfigBuilder};

/// Mirror settings that can be overridden on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct MirrorArgs {
    /// Directory to mirror
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory that receives the mirror
    #[arg(long, value_name = "DIR")]
    pub replica: Option<PathBuf>,

    /// Seconds between the starts of two passes
    #[arg(long = "sync-period", value_name = "SECONDS")]
    pub sync_period: Option<u64>,

    /// Anchor for relative paths (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Directory holding the operation log
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// File name of the operation log
    #[arg(long, value_name = "NAME")]
    pub log_file_name: Option<String>,

    /// Start from an empty replica and an empty operation log
    #[arg(long)]
    pub fresh: bool,
}

impl MirrorArgs {
    /// Layer the flags given on the command line over `config`
    pub fn apply(&self, config: Config) -> Config {
        let mut builder = ConfigBuilder::from_config(config);
        if let Some(source) = &self.source {
            builder = builder.mirror_source(source.clone());
        }
        if let Some(replica) = &self.replica {
            builder = builder.mirror_replica(replica.clone());
        }
        if let Some(period) = self.sync_period {
            builder = builder.mirror_period_secs(period);
        }
        if let Some(base) = &self.base_dir {
            builder = builder.mirror_base_dir(base.clone());
        }
        if let Some(dir) = &self.log_dir {
            builder = builder.logging_dir(dir.clone());
        }
        if let Some(name) = &self.log_file_name {
            builder = builder.logging_file_name(name.clone());
        }
        if self.fresh {
            builder = builder
                .mirror_clean_replica_on_start(true)
                .logging_truncate_on_start(true);
        }
        builder.build()
    }
}
