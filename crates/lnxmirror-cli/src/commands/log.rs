//! Log command - Show the tail of the operation log

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use lnxmirror_audit::read_tail;
use lnxmirror_core::config::ConfigBuilder;

use crate::{context::CliContext, output::get_formatter, session};

/// Log command arguments
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Number of lines to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub lines: usize,

    /// Directory holding the operation log
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// File name of the operation log
    #[arg(long, value_name = "NAME")]
    pub log_file_name: Option<String>,
}

impl LogCommand {
    /// Execute the log command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());

        let mut builder = ConfigBuilder::from_config(ctx.config.clone());
        if let Some(dir) = &self.log_dir {
            builder = builder.logging_dir(dir.clone());
        }
        if let Some(name) = &self.log_file_name {
            builder = builder.logging_file_name(name.clone());
        }
        let path = session::log_path(&builder.build())?;

        let lines = read_tail(&path, self.lines)?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "path": path.display().to_string(),
                "lines": lines,
            }));
        } else if lines.is_empty() {
            formatter.info(&format!("No operations logged in {}", path.display()));
        } else {
            for line in &lines {
                println!("{}", line);
            }
        }

        Ok(())
    }
}
