//! Configuration loading and management
//!
//! Handles parsing of `tally.toml`. The file is looked up from the
//! `TALLY_CONFIG` environment variable, then the platform config
//! directory; a missing file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::task::SortField;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Override for the data root directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Owner configuration
    #[serde(default)]
    pub owner: OwnerConfig,

    /// Task configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            owner: OwnerConfig::default(),
            tasks: TasksConfig::default(),
        }
    }
}

/// Owner-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    /// Default owner name when none is set any other way
    #[serde(default)]
    pub default: Option<String>,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self { default: None }
    }
}

/// Task-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority used when `add` is called without `--priority`
    #[serde(default = "default_priority")]
    pub default_priority: u8,

    /// Sort field used when `list` is called without `--sort`
    #[serde(default = "default_sort")]
    pub default_sort: String,

    /// How long a mutation waits for the per-owner store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_priority() -> u8 {
    3
}

fn default_sort() -> String {
    "start".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    crate::lock::DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
            default_sort: default_sort(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `tally.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `TALLY_CONFIG` or the platform config directory, or
    /// return defaults when neither exists.
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("TALLY_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::load(&path).unwrap_or_default();
            }
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "tally") {
            let path = dirs.config_dir().join("tally.toml");
            if path.exists() {
                return Self::load(&path).unwrap_or_default();
            }
        }

        Self::default()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.tasks.validate()?;
        if let Some(default) = &self.owner.default {
            crate::owner::validate_owner_name(default)
                .map_err(|e| Error::InvalidConfig(format!("owner.default: {e}")))?;
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.default_priority) {
            return Err(Error::InvalidConfig(format!(
                "tasks.default_priority must be between 1 and 5, got {}",
                self.default_priority
            )));
        }

        self.default_sort.parse::<SortField>().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_sort: unknown field '{}'",
                self.default_sort
            ))
        })?;

        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "tasks.lock_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
