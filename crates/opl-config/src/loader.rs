//! Configuration file loading

use crate::OplConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads [`OplConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config file location: `<config_dir>/opl/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("opl")
            .join("config.toml")
    }

    /// Load configuration asynchronously
    ///
    /// An explicit path must exist. When no path is given the default location
    /// is used, and a missing default file yields the default configuration.
    pub async fn load(path: Option<&Path>) -> ConfigResult<OplConfig> {
        let (file_path, required) = Self::resolve(path);

        if !required && !file_path.exists() {
            debug!(path = %file_path.display(), "no config file, using defaults");
            return Ok(OplConfig::default());
        }

        let content = tokio::fs::read_to_string(&file_path)
            .await
            .map_err(|source| ConfigError::Io {
                path: file_path.clone(),
                source,
            })?;
        Self::parse(&content, file_path)
    }

    /// Load configuration synchronously (for non-async contexts)
    pub fn load_sync(path: Option<&Path>) -> ConfigResult<OplConfig> {
        let (file_path, required) = Self::resolve(path);

        if !required && !file_path.exists() {
            debug!(path = %file_path.display(), "no config file, using defaults");
            return Ok(OplConfig::default());
        }

        let content = std::fs::read_to_string(&file_path).map_err(|source| ConfigError::Io {
            path: file_path.clone(),
            source,
        })?;
        Self::parse(&content, file_path)
    }

    fn resolve(path: Option<&Path>) -> (PathBuf, bool) {
        match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        }
    }

    fn parse(content: &str, path: PathBuf) -> ConfigResult<OplConfig> {
        let config: OplConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
