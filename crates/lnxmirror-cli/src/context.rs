//! Shared state handed to every command

use std::path::PathBuf;

use lnxmirror_core::config::Config;

use crate::output::OutputFormat;

/// Global options and the loaded configuration
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Configuration loaded from `config_path` (or defaults)
    pub config: Config,
    /// File the configuration was (or would be) loaded from
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CliContext {
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
