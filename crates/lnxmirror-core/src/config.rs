//! Configuration module for LNXMirror.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Command-line flags are applied on top of the loaded values by the CLI.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, handle::DirectoryHandle};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for LNXMirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub logging: LoggingConfig,
}

/// Mirroring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Directory to be mirrored. Relative paths are anchored at `base_dir`.
    pub source: PathBuf,
    /// Destination of the mirror (the replica).
    pub replica: PathBuf,
    /// Seconds between the scheduled starts of two mirror passes.
    pub period_secs: u64,
    /// Anchor for relative `source`/`replica` paths. `None` means the
    /// process working directory.
    pub base_dir: Option<PathBuf>,
    /// Remove the replica entirely before the first pass.
    pub clean_replica_on_start: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Diagnostic log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Directory holding the operation log. Relative paths are anchored at
    /// `mirror.base_dir`.
    pub dir: PathBuf,
    /// File name of the operation log inside `dir`.
    pub file_name: String,
    /// Start every run with an empty operation log.
    pub truncate_on_start: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/lnxmirror/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("lnxmirror")
            .join("config.yaml")
    }

    /// Full path of the operation log file (`logging.dir` + `logging.file_name`).
    pub fn log_file_path(&self) -> PathBuf {
        self.logging.dir.join(&self.logging.file_name)
    }

    /// Mirror period as a [`Duration`].
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.mirror.period_secs)
    }

    /// Validate and turn any problems into a single [`DomainError`].
    pub fn ensure_valid(&self) -> Result<(), DomainError> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(DomainError::ValidationFailed(joined))
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.
// (clippy::derivable_impls)

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("tests/sourceDir"),
            replica: PathBuf::from("tests/replicaDir"),
            period_secs: 5,
            base_dir: None,
            clean_replica_on_start: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("tests/logDir"),
            file_name: "sync.log".to_string(),
            truncate_on_start: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"mirror.period_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- mirror ---
        if self.mirror.period_secs == 0 {
            errors.push(ValidationError {
                field: "mirror.period_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.mirror.source.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "mirror.source".into(),
                message: "must not be empty".into(),
            });
        }

        if self.mirror.replica.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "mirror.replica".into(),
                message: "must not be empty".into(),
            });
        }

        errors.extend(self.layout_errors());

        if let Some(base) = &self.mirror.base_dir {
            if !base.is_absolute() {
                errors.push(ValidationError {
                    field: "mirror.base_dir".into(),
                    message: format!("must be an absolute path: {}", base.display()),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if self.logging.file_name.is_empty() {
            errors.push(ValidationError {
                field: "logging.file_name".into(),
                message: "must not be empty".into(),
            });
        } else if self.logging.file_name.contains(['/', '\\']) {
            errors.push(ValidationError {
                field: "logging.file_name".into(),
                message: "must be a bare file name; use logging.dir for the directory".into(),
            });
        }

        errors
    }
}

impl Config {
    /// Directory relative paths are anchored at
    ///
    /// `mirror.base_dir` when it is absolute, otherwise the working
    /// directory. `None` when neither is usable.
    pub fn anchor_dir(&self) -> Option<PathBuf> {
        match &self.mirror.base_dir {
            Some(base) if base.is_absolute() => Some(base.clone()),
            Some(_) => None,
            None => std::env::current_dir().ok(),
        }
    }

    /// Checks how source, replica and log directory sit relative to each other
    ///
    /// Paths are compared after anchoring and lexical normalisation, so
    /// `src` and `./src/inner` are caught as nested.
    fn layout_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.mirror.source.as_os_str().is_empty() || self.mirror.replica.as_os_str().is_empty()
        {
            return errors;
        }
        let Some(base) = self.anchor_dir() else {
            return errors;
        };

        let resolve = |field: &str, configured: &Path, errors: &mut Vec<ValidationError>| {
            match DirectoryHandle::resolve(configured, &base) {
                Ok(handle) => Some(handle.into_path_buf()),
                Err(e) => {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: e.to_string(),
                    });
                    None
                }
            }
        };
        let source = resolve("mirror.source", &self.mirror.source, &mut errors);
        let replica = resolve("mirror.replica", &self.mirror.replica, &mut errors);
        let log_dir = resolve("logging.dir", &self.logging.dir, &mut errors);

        // Nested roots would make a pass copy the replica into itself.
        if let (Some(source), Some(replica)) = (&source, &replica) {
            if source == replica {
                errors.push(ValidationError {
                    field: "mirror.replica".into(),
                    message: "must differ from mirror.source".into(),
                });
            } else if replica.starts_with(source) {
                errors.push(ValidationError {
                    field: "mirror.replica".into(),
                    message: format!("must not be inside source {}", source.display()),
                });
            } else if source.starts_with(replica) {
                errors.push(ValidationError {
                    field: "mirror.source".into(),
                    message: format!("must not be inside replica {}", replica.display()),
                });
            }
        }

        // A log inside the replica is deleted by every pass; inside the
        // source it is copied by every pass.
        if let Some(log_dir) = &log_dir {
            for (name, root) in [("source", &source), ("replica", &replica)] {
                if let Some(root) = root {
                    if log_dir.starts_with(root) {
                        errors.push(ValidationError {
                            field: "logging.dir".into(),
                            message: format!("must not be inside {} {}", name, root.display()),
                        });
                    }
                }
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use lnxmirror_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .mirror_source(PathBuf::from("/home/user/Documents"))
///     .mirror_replica(PathBuf::from("/mnt/backup/Documents"))
///     .mirror_period_secs(60)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration (e.g. one loaded from disk).
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- mirror ---

    pub fn mirror_source(mut self, source: PathBuf) -> Self {
        self.config.mirror.source = source;
        self
    }

    pub fn mirror_replica(mut self, replica: PathBuf) -> Self {
        self.config.mirror.replica = replica;
        self
    }

    pub fn mirror_period_secs(mut self, seconds: u64) -> Self {
        self.config.mirror.period_secs = seconds;
        self
    }

    pub fn mirror_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.config.mirror.base_dir = Some(base_dir);
        self
    }

    pub fn mirror_clean_replica_on_start(mut self, clean: bool) -> Self {
        self.config.mirror.clean_replica_on_start = clean;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_dir(mut self, dir: PathBuf) -> Self {
        self.config.logging.dir = dir;
        self
    }

    pub fn logging_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.config.logging.file_name = file_name.into();
        self
    }

    pub fn logging_truncate_on_start(mut self, truncate: bool) -> Self {
        self.config.logging.truncate_on_start = truncate;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
