//! lnxmirror CLI - One-way directory mirroring
//!
//! Provides commands for:
//! - Mirroring a source tree onto a replica on a fixed period
//! - Running a single mirror pass
//! - Viewing and managing configuration
//! - Reading the operation log

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lnxmirror_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;
mod session;

use commands::{config::ConfigCommand, log::LogCommand, once::OnceCommand, run::RunCommand};
use context::CliContext;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "lnxmirror",
    version,
    about = "Keep a replica directory identical to a source directory"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mirror continuously until interrupted
    Run(RunCommand),
    /// Run a single mirror pass and exit
    Once(OnceCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show the most recent operation log entries
    Log(LogCommand),
}

/// Load the configuration at `path`
///
/// A missing file yields defaults. A file that exists but does not parse is
/// an error unless `lenient` is set, so `config validate` can still report it.
fn load_config(path: &Path, lenient: bool) -> Result<Config> {
    if !path.exists() || lenient {
        return Ok(Config::load_or_default(path));
    }
    Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_tracing(cli: &Cli, config: &Config) {
    let filter = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Diagnostics go to stderr so stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let lenient = matches!(
        cli.command,
        Commands::Config(ConfigCommand::Validate | ConfigCommand::Path)
    );
    let config = load_config(&config_path, lenient)?;

    init_tracing(&cli, &config);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CliContext {
        config,
        config_path,
        format,
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Run(cmd) => cmd.execute(&ctx).await,
        Commands::Once(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Log(cmd) => cmd.execute(&ctx).await,
    }
}
