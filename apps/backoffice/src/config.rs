//! # Backoffice Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--db`)
//! 2. Environment variables (`DUKA_*`)
//! 3. Config file (`backoffice.toml`)
//! 4. Defaults (this file)
//!
//! ```toml
//! database_path = "/var/lib/duka/duka.db"
//! system_staff = "system"
//! stacking_order = "type_aware"
//! log_filter = "info,duka=debug,sqlx=warn"
//! ```
//!
//! The result is validated once and read-only afterwards.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use duka_core::{StackingOrder, DEFAULT_SYSTEM_STAFF};

const CONFIG_FILE: &str = "backoffice.toml";
const DATABASE_FILE: &str = "duka.db";

/// Backoffice configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackofficeConfig {
    /// SQLite database file.
    /// Default: platform data directory, e.g. `~/.local/share/duka-pos/duka.db`
    pub database_path: PathBuf,

    /// Username the expiry batch runs as. Must already exist.
    pub system_staff: String,

    /// Discount precedence used by the sale engine and the discount check.
    pub stacking_order: StackingOrder,

    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Pool size. The CLI is single-threaded per command; 2 is plenty.
    pub max_connections: u32,

    /// Horizon for the "expiring soon" section of the reorder report.
    pub expiring_within_days: u64,
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        BackofficeConfig {
            database_path: default_database_path(),
            system_staff: DEFAULT_SYSTEM_STAFF.to_string(),
            stacking_order: StackingOrder::default(),
            log_filter: "info,duka=debug,sqlx=warn".to_string(),
            max_connections: 2,
            expiring_within_days: 7,
        }
    }
}

impl BackofficeConfig {
    /// Loads defaults, then the config file, then `DUKA_*` variables.
    ///
    /// An explicit `path` must exist; the default file location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => BackofficeConfig::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies environment overrides.
    ///
    /// ## Environment Variables
    /// - `DUKA_DB_PATH`: database file
    /// - `DUKA_SYSTEM_STAFF`: username for the expiry batch
    /// - `DUKA_STACKING_ORDER`: `type_aware` or `raw_value`
    /// - `DUKA_LOG`: tracing filter
    /// - `DUKA_MAX_CONNECTIONS`: pool size
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DUKA_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(username) = lookup("DUKA_SYSTEM_STAFF") {
            self.system_staff = username;
        }

        if let Some(order) = lookup("DUKA_STACKING_ORDER") {
            self.stacking_order = order.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DUKA_STACKING_ORDER".to_string(),
                value: order,
            })?;
        }

        if let Some(filter) = lookup("DUKA_LOG") {
            self.log_filter = filter;
        }

        if let Some(max) = lookup("DUKA_MAX_CONNECTIONS") {
            self.max_connections = max.parse().map_err(|_| ConfigError::InvalidValue {
                key: "DUKA_MAX_CONNECTIONS".to_string(),
                value: max,
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }

        if self.system_staff.trim().is_empty() {
            return Err(ConfigError::MissingRequired("system_staff".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "duka", "pos")
}

/// `backoffice.toml` in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
