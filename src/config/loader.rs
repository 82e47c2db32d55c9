use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::credentials::{SecureString, API_KEY_ENV};
use crate::config::types::Config;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/flipdeck/config.toml` on Unix,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("flipdeck").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()` (not ready).
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// Used to remember the endpoint (and optionally the key) between runs.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The endpoint URL, when present, is http(s)
    /// - Timeouts are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = self.endpoint.url.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError {
                    message: format!("Endpoint URL '{}' must start with http:// or https://", url),
                });
            }
        }

        if self.defaults.timeout_seconds == 0 || self.defaults.connect_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Timeouts must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Replace the API key when `value` is a non-empty override.
    pub fn with_api_key_override(mut self, value: Option<String>) -> Self {
        if let Some(key) = value.filter(|k| !k.is_empty()) {
            self.endpoint.api_key = Some(SecureString::new(key));
        }
        self
    }

    /// Apply `FLIPDECK_API_KEY` from the environment.
    pub fn apply_env(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }
}
