//! Run command - Mirror continuously until interrupted
//!
//! Provides the `lnxmirror run` CLI command which:
//! 1. Applies command-line overrides to the loaded configuration
//! 2. Opens the operation log and resolves (optionally wipes) the roots
//! 3. Runs a pass immediately and then every period until SIGINT/SIGTERM

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lnxmirror_sync::MirrorScheduler;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::MirrorArgs;
use crate::{
    context::CliContext,
    output::{get_formatter, OutputFormat, TICK_BANNER},
    session::MirrorSession,
};

/// Run command with mirror overrides
#[derive(Debug, Args)]
pub struct RunCommand {
    #[command(flatten)]
    pub mirror: MirrorArgs,
}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());
        let config = self.mirror.apply(ctx.config.clone());

        let session = MirrorSession::prepare(&config, ctx.format, !ctx.quiet)?;
        let scheduler = MirrorScheduler::new(config.period(), CancellationToken::new())?;

        tokio::spawn(shutdown_signal(scheduler.shutdown_token()));

        if !ctx.quiet && ctx.format == OutputFormat::Human {
            formatter.success(&format!(
                "Mirroring {} to {} every {}s (Ctrl+C to stop)",
                session.source,
                session.replica,
                config.mirror.period_secs
            ));
            formatter.info(&format!("Operation log: {}", session.log_path.display()));
        }

        let show_banner = !ctx.quiet && ctx.format == OutputFormat::Human;
        let ticks = scheduler
            .run(|_tick| {
                if show_banner {
                    println!("{}", TICK_BANNER.purple());
                }
                let report = session.mirror();
                if report.has_errors() {
                    warn!(
                        errors = report.errors.len(),
                        "Mirror pass finished with errors"
                    );
                }
            })
            .await;

        info!(ticks, "Mirroring stopped");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "ticks": ticks,
            }));
        } else if !ctx.quiet {
            formatter.success(&format!("Stopped after {} pass(es)", ticks));
        }

        Ok(())
    }
}

/// Cancel `token` on SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
