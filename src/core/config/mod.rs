//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. `$GITSHIM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitshim/config.toml` (platform config dir elsewhere)
//!
//! Missing files are not an error; defaults are used. The file is only ever
//! read: repository settings live in the repository's own git config.
//!
//! # Example
//!
//! ```no_run
//! use gitshim::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Identity: {}", config.identity());
//! ```

pub mod schema;

pub use schema::{AuthConfig, ClientConfig, IdentityConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::Identity;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GITSHIM_CONFIG";

/// Remote used when none is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch used by `init` when none is configured.
pub const DEFAULT_INIT_BRANCH: &str = "main";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub client: ClientConfig,
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let client: ClientConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        client.validate()?;

        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(Self {
            client,
            path: Some(path.to_path_buf()),
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        dirs::config_dir()
            .map(|dir| dir.join("gitshim/config.toml"))
            .filter(|path| path.exists())
    }

    /// Path of the file this config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Default remote name.
    pub fn remote(&self) -> &str {
        self.client.remote.as_deref().unwrap_or(DEFAULT_REMOTE)
    }

    /// Branch name used when initializing repositories.
    pub fn init_branch(&self) -> &str {
        self.client
            .init_branch
            .as_deref()
            .unwrap_or(DEFAULT_INIT_BRANCH)
    }

    /// Committer identity, falling back to [`Identity::default`].
    pub fn identity(&self) -> Identity {
        self.client
            .identity
            .clone()
            .map(Identity::from)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.remote(), DEFAULT_REMOTE);
        assert_eq!(config.init_branch(), DEFAULT_INIT_BRANCH);
        assert_eq!(config.identity(), Identity::default());
        assert!(config.path().is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "remote = \"upstream\"\n[identity]\nname = \"A\"\nemail = \"a@b.c\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.remote(), "upstream");
        assert_eq!(config.identity(), Identity::new("A", "a@b.c"));
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "remote = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load_from(Path::new("/nonexistent/gitshim.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "init_branch = \"-bad\"\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
