//! Once command - Run a single mirror pass
//!
//! Provides the `lnxmirror once` CLI command which runs exactly one pass
//! and prints its report. Exits with an error if any operation failed.

use anyhow::{Context, Result};
use clap::Args;

use super::MirrorArgs;
use crate::{
    context::CliContext,
    output::{get_formatter, OutputFormat},
    session::MirrorSession,
};

/// Once command with mirror overrides
#[derive(Debug, Args)]
pub struct OnceCommand {
    #[command(flatten)]
    pub mirror: MirrorArgs,
}

impl OnceCommand {
    /// Execute the once command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());
        let config = self.mirror.apply(ctx.config.clone());

        // JSON mode prints only the report, so operations stay off stdout.
        let console = !ctx.quiet && ctx.format == OutputFormat::Human;
        let session = MirrorSession::prepare(&config, ctx.format, console)?;

        let report = session.mirror();

        if ctx.is_json() {
            let json = serde_json::to_value(&report).context("Failed to serialize report")?;
            formatter.print_json(&json);
        } else if !ctx.quiet {
            formatter.success(&format!(
                "Mirror pass complete ({}) in {}ms",
                report.outcome, report.duration_ms
            ));
            formatter.info(&format!("Created:  {}", report.created));
            formatter.info(&format!("Copied:   {}", report.copied));
            formatter.info(&format!(
                "Updated:  {} ({} newer in source, {} newer in replica)",
                report.updated,
                report.src_newer.len(),
                report.dst_newer.len()
            ));
            formatter.info(&format!("Deleted:  {}", report.deleted));
            for error in &report.errors {
                formatter.warn(error);
            }
        }

        if report.has_errors() {
            anyhow::bail!("{} operation(s) failed", report.errors.len());
        }
        Ok(())
    }
}
