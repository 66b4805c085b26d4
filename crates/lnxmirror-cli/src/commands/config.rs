//! Config command - View and manage lnxmirror configuration
//!
//! Provides the `lnxmirror config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the path the configuration is read from

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use lnxmirror_core::config::Config;
use tracing::info;

use crate::{context::CliContext, output::get_formatter};

/// Keys accepted by `config set`, with a short description each
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("mirror.source", "Directory to mirror"),
    ("mirror.replica", "Directory that receives the mirror"),
    ("mirror.period_secs", "Seconds between the starts of two passes"),
    ("mirror.base_dir", "Anchor for relative paths (none = working dir)"),
    ("mirror.clean_replica_on_start", "true|false"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.dir", "Directory holding the operation log"),
    ("logging.file_name", "File name of the operation log"),
    ("logging.truncate_on_start", "true|false"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "mirror.period_secs")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
            ConfigCommand::Path => self.execute_path(ctx),
        }
    }

    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&ctx.config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&ctx.config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());
        let config_path = &ctx.config_path;
        let mut config = ctx.config.clone();

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": format!("{:#}", e),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {:#}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, help) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<32} - {}", name, help));
                }
            }
            anyhow::bail!("Unknown or invalid configuration value for '{}'", key);
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    messages.join("; ")
                ));
            }
            anyhow::bail!("Configuration rejected, nothing was saved");
        }

        save_config(&config, config_path)?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.is_json());
        let config_path = &ctx.config_path;

        // A missing file means the defaults are in effect, so those get checked.
        let using_defaults = !config_path.exists();
        let config = if using_defaults {
            if !ctx.is_json() {
                formatter.info(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                formatter.info(
                    "Using default configuration. Run 'lnxmirror config set <key> <value>' to create one.",
                );
            }
            Config::default()
        } else {
            match Config::load(config_path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    if ctx.is_json() {
                        formatter.print_json(&serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "using_defaults": false,
                            "errors": [format!("Failed to parse configuration: {:#}", e)],
                        }));
                    } else {
                        formatter.error(&format!("Failed to parse configuration: {:#}", e));
                        formatter.info(&format!("File: {}", config_path.display()));
                    }
                    anyhow::bail!("Configuration file could not be parsed");
                }
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "using_defaults": using_defaults,
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration is invalid");
        }
        Ok(())
    }

    fn execute_path(&self, ctx: &CliContext) -> Result<()> {
        if ctx.is_json() {
            get_formatter(true).print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "exists": ctx.config_path.exists(),
            }));
        } else {
            println!("{}", ctx.config_path.display());
        }
        Ok(())
    }
}

fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context("Failed to create configuration directory")?;
        }
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(path, yaml).context("Failed to write configuration file")?;
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Expected true or false for {}", key),
    }
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// See [`SUPPORTED_KEYS`] for the accepted keys.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- mirror ---
        "mirror.source" => {
            config.mirror.source = PathBuf::from(value);
        }
        "mirror.replica" => {
            config.mirror.replica = PathBuf::from(value);
        }
        "mirror.period_secs" => {
            config.mirror.period_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for mirror.period_secs")?;
        }
        "mirror.base_dir" => {
            config.mirror.base_dir = if value.is_empty() || value == "none" {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "mirror.clean_replica_on_start" => {
            config.mirror.clean_replica_on_start = parse_bool(key, value)?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.dir" => {
            config.logging.dir = PathBuf::from(value);
        }
        "logging.file_name" => {
            config.logging.file_name = value.to_string();
        }
        "logging.truncate_on_start" => {
            config.logging.truncate_on_start = parse_bool(key, value)?;
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mirror_roots() {
        let mut config = Config::default();
        apply_config_value(&mut config, "mirror.source", "/data").unwrap();
        apply_config_value(&mut config, "mirror.replica", "/backup").unwrap();
        assert_eq!(config.mirror.source, PathBuf::from("/data"));
        assert_eq!(config.mirror.replica, PathBuf::from("/backup"));
    }

    #[test]
    fn test_apply_period() {
        let mut config = Config::default();
        apply_config_value(&mut config, "mirror.period_secs", "60").unwrap();
        assert_eq!(config.mirror.period_secs, 60);
    }

    #[test]
    fn test_apply_base_dir_and_none() {
        let mut config = Config::default();
        apply_config_value(&mut config, "mirror.base_dir", "/srv").unwrap();
        assert_eq!(config.mirror.base_dir, Some(PathBuf::from("/srv")));

        apply_config_value(&mut config, "mirror.base_dir", "none").unwrap();
        assert_eq!(config.mirror.base_dir, None);
    }

    #[test]
    fn test_apply_booleans() {
        let mut config = Config::default();
        apply_config_value(&mut config, "mirror.clean_replica_on_start", "true").unwrap();
        apply_config_value(&mut config, "logging.truncate_on_start", "yes").unwrap();
        assert!(config.mirror.clean_replica_on_start);
        assert!(config.logging.truncate_on_start);

        let result = apply_config_value(&mut config, "logging.truncate_on_start", "maybe");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_logging_keys() {
        let mut config = Config::default();
        apply_config_value(&mut config, "logging.level", "debug").unwrap();
        apply_config_value(&mut config, "logging.dir", "/var/log/lnxmirror").unwrap();
        apply_config_value(&mut config, "logging.file_name", "ops.log").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.log_file_path(),
            PathBuf::from("/var/log/lnxmirror/ops.log")
        );
    }

    #[test]
    fn test_apply_unknown_key_fails() {
        let mut config = Config::default();
        let result = apply_config_value(&mut config, "unknown.key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_negative_period_fails() {
        let mut config = Config::default();
        let result = apply_config_value(&mut config, "mirror.period_secs", "-5");
        assert!(result.is_err());
    }

    #[test]
    fn test_every_supported_key_is_accepted() {
        for (key, _) in SUPPORTED_KEYS {
            let value = match *key {
                "mirror.period_secs" => "3",
                "mirror.clean_replica_on_start" | "logging.truncate_on_start" => "false",
                "logging.level" => "warn",
                _ => "x",
            };
            let mut config = Config::default();
            assert!(
                apply_config_value(&mut config, key, value).is_ok(),
                "{key} rejected"
            );
        }
    }

    #[test]
    fn test_save_config_round_trips_through_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/config.yaml");
        let mut config = Config::default();
        config.mirror.period_secs = 42;

        save_config(&config, &path).unwrap();

        assert_eq!(Config::load(&path).unwrap().mirror.period_secs, 42);
    }
}
