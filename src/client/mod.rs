//! client
//!
//! The git-client façade.
//!
//! # Architecture
//!
//! [`GitClient`] is a repository handle: a working directory, a committer
//! identity, optional transport credentials, and a shared [`Engine`]. Each
//! operation either issues a short, fixed sequence of engine primitives
//! (strictly one after another) and reshapes the results, or belongs to the
//! [unsupported set](unsupported) and fails without touching the engine.
//!
//! # Invariants
//!
//! - Engine errors reach the caller unchanged as [`ClientError::Delegate`]
//! - Only [`GitClient::check_is_repo`] and the batch operations
//!   ([`GitClient::delete_local_branches`], [`GitClient::push_tags`])
//!   capture engine errors instead of returning them
//! - The handle is mutated only through `&mut self`, so it cannot change
//!   under an operation in flight
//!
//! # Example
//!
//! ```
//! use gitshim::client::GitClient;
//! use gitshim::core::status::StatusRow;
//! use gitshim::engine::mock::MockEngine;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let engine = MockEngine::with_repo("main");
//! engine.set_status(vec![StatusRow::from_codes("src/lib.rs", 1, 2, 2).unwrap()]);
//!
//! let client = GitClient::new("/repo", Arc::new(engine));
//! let status = client.status().await.unwrap();
//!
//! assert_eq!(status.current, "main");
//! assert_eq!(status.modified, vec!["src/lib.rs"]);
//! assert_eq!(status.staged, vec!["src/lib.rs"]);
//! # });
//! ```

pub mod callback;
mod error;
pub mod options;
mod refs;
mod remote;
mod repository;
pub mod results;
pub mod unsupported;

pub use error::{ClientError, UnsupportedError};
pub use options::{
    BranchOptions, CheckRepoAction, CloneOptions, CommitOptions, FetchOptions, InitOptions,
    LogOptions, MergeOptions, PullOptions, PushOptions,
};
pub use unsupported::UnsupportedOperation;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::{Config, DEFAULT_INIT_BRANCH, DEFAULT_REMOTE};
use crate::core::merge::{classify_merge, MergeReport, MergeSummary};
use crate::core::status::DETACHED_PLACEHOLDER;
use crate::core::types::Identity;
use crate::engine::{Credentials, Engine, EngineError};

/// A repository handle exposing the client operation set.
#[derive(Debug, Clone)]
pub struct GitClient {
    dir: PathBuf,
    engine: Arc<dyn Engine>,
    auth: Option<Credentials>,
    identity: Identity,
    remote: String,
    init_branch: String,
}

impl GitClient {
    /// Create a handle for `dir` with default identity and no credentials.
    pub fn new(dir: impl Into<PathBuf>, engine: Arc<dyn Engine>) -> Self {
        Self {
            dir: dir.into(),
            engine,
            auth: None,
            identity: Identity::default(),
            remote: DEFAULT_REMOTE.to_string(),
            init_branch: DEFAULT_INIT_BRANCH.to_string(),
        }
    }

    /// Create a handle with identity, credentials, and defaults from `config`.
    pub fn from_config(dir: impl Into<PathBuf>, engine: Arc<dyn Engine>, config: &Config) -> Self {
        Self {
            dir: dir.into(),
            engine,
            auth: config.client.auth.clone().map(|auth| Credentials {
                username: auth.username,
                password: auth.password,
            }),
            identity: config.identity(),
            remote: config.remote().to_string(),
            init_branch: config.init_branch().to_string(),
        }
    }

    /// Working directory every operation runs in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Change the working directory. Relative paths resolve against the
    /// current one.
    pub fn cwd(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref();
        self.dir = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        };
        tracing::debug!(dir = %self.dir.display(), "changed working directory");
        self
    }

    /// Committer identity used for commits, merges, and annotated tags.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn set_identity(&mut self, identity: Identity) -> &mut Self {
        self.identity = identity;
        self
    }

    /// Credentials for clone, fetch, pull, and push. `None` clears them.
    pub fn set_auth(&mut self, auth: Option<Credentials>) -> &mut Self {
        self.auth = auth;
        self
    }

    /// Remote used when an operation does not name one.
    pub fn default_remote(&self) -> &str {
        &self.remote
    }

    fn remote_or_default(&self, remote: Option<String>) -> String {
        remote.unwrap_or_else(|| self.remote.clone())
    }

    /// Current branch name, or the detached placeholder.
    async fn branch_label(&self) -> Result<String, EngineError> {
        Ok(self
            .engine
            .current_branch(&self.dir)
            .await?
            .unwrap_or_else(|| DETACHED_PLACEHOLDER.to_string()))
    }

    /// Current branch, failing when HEAD is detached.
    async fn require_branch(&self) -> Result<String, EngineError> {
        self.engine
            .current_branch(&self.dir)
            .await?
            .ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })
    }

    /// Classify a merge report. The matrix the engine captured during the
    /// merge is preferred; otherwise it is read only when the merge
    /// produced a tree.
    async fn summarize_merge(&self, mut report: MergeReport) -> Result<MergeSummary, ClientError> {
        let rows = match (report.tree.is_some(), report.matrix.take()) {
            (false, _) => Vec::new(),
            (true, Some(rows)) => rows,
            (true, None) => self.engine.status_matrix(&self.dir).await?,
        };
        Ok(classify_merge(&report, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AuthConfig, ClientConfig, IdentityConfig};
    use crate::engine::mock::MockEngine;

    fn client() -> GitClient {
        GitClient::new("/repo", Arc::new(MockEngine::with_repo("main")))
    }

    #[test]
    fn cwd_resolves_relative_paths() {
        let mut client = client();
        client.cwd("sub");
        assert_eq!(client.dir(), Path::new("/repo/sub"));
        client.cwd("/other");
        assert_eq!(client.dir(), Path::new("/other"));
    }

    #[test]
    fn setters_chain() {
        let mut client = client();
        client
            .set_identity(Identity::new("A", "a@b.c"))
            .set_auth(Some(Credentials {
                username: "u".into(),
                password: None,
            }));
        assert_eq!(client.identity(), &Identity::new("A", "a@b.c"));
        assert!(client.auth.is_some());
    }

    #[test]
    fn from_config_applies_settings() {
        let mut config = Config::default();
        config.client = ClientConfig {
            remote: Some("upstream".into()),
            init_branch: Some("trunk".into()),
            identity: Some(IdentityConfig {
                name: "A".into(),
                email: "a@b.c".into(),
            }),
            auth: Some(AuthConfig {
                username: "token".into(),
                password: Some("secret".into()),
            }),
        };
        let client =
            GitClient::from_config("/repo", Arc::new(MockEngine::with_repo("main")), &config);

        assert_eq!(client.default_remote(), "upstream");
        assert_eq!(client.init_branch, "trunk");
        assert_eq!(client.identity(), &Identity::new("A", "a@b.c"));
        assert_eq!(client.auth.as_ref().map(|a| a.username.as_str()), Some("token"));
        assert!(!format!("{client:?}").contains("secret"));
    }
}
