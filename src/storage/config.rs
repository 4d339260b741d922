//! Configuration handling
//!
//! Optional user configuration lives in `config.toml` inside the platform
//! config directory (e.g. `~/.config/task-tracker/config.toml` on Linux).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name used when nothing else is configured
pub const DEFAULT_DATA_FILE: &str = "task_data.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Location of the JSON data file
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Returns the config directory for this tool
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "task-tracker", "task-tracker")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_dir() {
            Some(dir) => Self::load_from(&dir.join("config.toml")),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Picks the data file: explicit override, then config, then the default
    pub fn resolve_data_file(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.data_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }
}
