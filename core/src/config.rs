//! Configuration management (config.toml)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. Every field has a default, so partial files are fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{AudioConfig, AudioError};
use crate::input::InputConfig;
use crate::scheduler::SchedulerConfig;

/// Name of the configuration file inside [`config_dir`]
pub const CONFIG_FILE: &str = "config.toml";

/// Synchronization layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// Error reading or writing a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Invalid(#[from] AudioError),
    #[error("no configuration directory available")]
    NoConfigDir,
}

impl Config {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audio.validate()?;
        Ok(())
    }

    /// Read and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_error)?;
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "retrosync", "retrosync")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the config directory.
///
/// Returns default values if the file doesn't exist, cannot be parsed or
/// fails validation.
pub fn load() -> Config {
    let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE)) else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match Config::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using default configuration", e);
            Config::default()
        }
    }
}

/// Saves the configuration to the config directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    config.save_to(&dir.join(CONFIG_FILE))
}
