//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: the default remote and the
//! init branch must be valid branch-like names, and identity fields must be
//! non-empty.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, Identity};

/// Client configuration.
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// init_branch = "main"
///
/// [identity]
/// name = "Jane Doe"
/// email = "jane@example.com"
///
/// [auth]
/// username = "token"
/// password = "secret"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Default remote for fetch, pull, and push
    pub remote: Option<String>,

    /// Default branch name for newly initialized repositories
    pub init_branch: Option<String>,

    /// Committer identity
    pub identity: Option<IdentityConfig>,

    /// Credentials handed to network operations
    pub auth: Option<AuthConfig>,
}

impl ClientConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            BranchName::new(remote.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid remote '{}': {}", remote, e))
            })?;
        }

        if let Some(branch) = &self.init_branch {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid init_branch '{}': {}", branch, e))
            })?;
        }

        if let Some(identity) = &self.identity {
            if identity.name.trim().is_empty() || identity.email.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "identity name and email cannot be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Identity section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: String,
    pub email: String,
}

impl From<IdentityConfig> for Identity {
    fn from(config: IdentityConfig) -> Self {
        Identity::new(config.name, config.email)
    }
}

/// Auth section.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}
