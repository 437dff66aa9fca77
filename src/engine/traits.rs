//! engine::traits
//!
//! The delegate-engine contract.
//!
//! # Design
//!
//! The `Engine` trait is async because engine primitives touch the disk and
//! the network. Every primitive takes the working directory as its first
//! argument: the façade owns the directory, engines hold no per-repository
//! state of their own. Engines never see the façade's option structs, only
//! the plain requests below.
//!
//! # Example
//!
//! ```ignore
//! use gitshim::engine::{Engine, EngineError};
//! use std::path::Path;
//!
//! async fn head(engine: &dyn Engine) -> Result<String, EngineError> {
//!     let oid = engine.resolve_ref(Path::new("."), "HEAD").await?;
//!     Ok(oid.short(7).to_string())
//! }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::merge::MergeReport;
use crate::core::status::StatusRow;
use crate::core::types::{Identity, Oid, TypeError};

/// Errors surfaced by an engine.
///
/// The façade hands these to callers unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID (or revision:path) that was not found
        oid: String,
    },

    /// Named remote is not configured.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Branch, tag, or remote already exists.
    #[error("already exists: {name}")]
    AlreadyExists {
        /// The existing name
        name: String,
    },

    /// Merge stopped on conflicting paths.
    #[error("merge conflict in {}", .paths.join(", "))]
    MergeConflict {
        /// Conflicting paths
        paths: Vec<String>,
    },

    /// Fast-forward was required but histories diverged.
    #[error("not a fast-forward: {refname}")]
    NotFastForward {
        /// The ref that could not be fast-forwarded
        refname: String,
    },

    /// Transport or authentication failure.
    #[error("network error: {message}")]
    Network {
        /// The error message
        message: String,
    },

    /// Filesystem error.
    #[error("i/o error: {message}")]
    Io {
        /// The error message
        message: String,
    },

    /// Anything else the engine reports.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<TypeError> for EngineError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => EngineError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) | TypeError::InvalidBranchName(msg) => {
                EngineError::InvalidRefName { message: msg }
            }
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io {
            message: err.to_string(),
        }
    }
}

/// Credentials handed to network primitives.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Repository initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub bare: bool,
    pub default_branch: String,
}

/// Clone a remote repository into `dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneRequest {
    pub url: String,
    pub dir: PathBuf,
    /// Branch to check out instead of the remote HEAD
    pub branch: Option<String>,
    /// Shallow clone depth
    pub depth: Option<u32>,
    /// Only fetch `branch`
    pub single_branch: bool,
    /// Skip populating the working tree
    pub no_checkout: bool,
}

/// Fetch from a configured remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub remote: String,
    /// Single branch to fetch; all configured refspecs when `None`
    pub branch: Option<String>,
    pub tags: bool,
    pub prune: bool,
}

/// Outcome of a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    /// Tip of the fetched branch, when a single branch was requested
    pub fetch_head: Option<Oid>,
}

/// Fetch and merge a remote branch into the current branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    pub remote: String,
    /// Remote branch; the current branch name when `None`
    pub branch: Option<String>,
    pub fast_forward_only: bool,
}

/// Push one ref to a remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRequest {
    pub remote: String,
    /// Full ref name pushed to the same name on the remote
    pub reference: String,
    pub force: bool,
    /// Delete the remote ref instead of updating it
    pub delete: bool,
}

/// Per-ref outcome of a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefUpdate {
    pub name: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Outcome of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub ok: bool,
    pub refs: Vec<RefUpdate>,
}

/// Record the index as a new commit on HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    pub author: Identity,
    /// Replace the HEAD commit instead of adding a child
    pub amend: bool,
}

/// Merge `theirs` into `ours`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequest {
    /// Branch receiving the merge; the current branch when `None`
    pub ours: Option<String>,
    /// Revision being merged in
    pub theirs: String,
    pub fast_forward_only: bool,
    /// Merge commit message
    pub message: Option<String>,
}

/// Walk history backwards from a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub reference: String,
    pub depth: Option<usize>,
}

/// Create an annotated tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTagRequest {
    pub name: String,
    pub message: String,
    /// Revision to tag; HEAD when `None`
    pub target: Option<String>,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    /// Author name
    pub author_name: String,
    /// Author email
    pub author_email: String,
    /// Author timestamp
    pub author_time: chrono::DateTime<chrono::Utc>,
    /// Parent commits, first parent first
    pub parents: Vec<Oid>,
}

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteInfo {
    pub name: String,
    pub url: String,
}

/// The delegate engine.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one engine can back several
/// façade handles across async tasks.
///
/// # Error Handling
///
/// Every primitive returns `Result<T, EngineError>`. Primitives either
/// complete or fail as a unit; none are retried by the façade.
#[async_trait]
pub trait Engine: Send + Sync + std::fmt::Debug {
    /// Root of the repository containing `dir`.
    async fn find_root(&self, dir: &Path) -> Result<PathBuf, EngineError>;

    /// Create a repository at `dir`.
    async fn init(&self, dir: &Path, request: InitRequest) -> Result<(), EngineError>;

    /// Clone `request.url` into `request.dir`.
    async fn clone_repo(
        &self,
        request: CloneRequest,
        auth: Option<Credentials>,
    ) -> Result<(), EngineError>;

    async fn fetch(
        &self,
        dir: &Path,
        request: FetchRequest,
        auth: Option<Credentials>,
    ) -> Result<FetchReport, EngineError>;

    async fn pull(
        &self,
        dir: &Path,
        request: PullRequest,
        author: Identity,
        auth: Option<Credentials>,
    ) -> Result<MergeReport, EngineError>;

    async fn push(
        &self,
        dir: &Path,
        request: PushRequest,
        auth: Option<Credentials>,
    ) -> Result<PushReport, EngineError>;

    /// Stage `path` (relative to `dir`). Missing files stage a deletion.
    async fn add(&self, dir: &Path, path: &str) -> Result<(), EngineError>;

    /// Remove `path` from the index, and from disk unless `keep_local`.
    async fn remove(&self, dir: &Path, path: &str, keep_local: bool) -> Result<(), EngineError>;

    async fn commit(&self, dir: &Path, request: CommitRequest) -> Result<Oid, EngineError>;

    /// Resolve a revision to an object id.
    async fn resolve_ref(&self, dir: &Path, name: &str) -> Result<Oid, EngineError>;

    /// Current branch name; `None` when HEAD is detached or unborn.
    async fn current_branch(&self, dir: &Path) -> Result<Option<String>, EngineError>;

    /// Local branches, or branches of `remote` with the remote prefix stripped.
    async fn list_branches(
        &self,
        dir: &Path,
        remote: Option<&str>,
    ) -> Result<Vec<String>, EngineError>;

    async fn list_tags(&self, dir: &Path) -> Result<Vec<String>, EngineError>;

    async fn list_remotes(&self, dir: &Path) -> Result<Vec<RemoteInfo>, EngineError>;

    /// Create a branch at `start` (HEAD when `None`), optionally checking it out.
    async fn create_branch(
        &self,
        dir: &Path,
        name: &str,
        start: Option<&str>,
        checkout: bool,
    ) -> Result<(), EngineError>;

    async fn delete_branch(&self, dir: &Path, name: &str) -> Result<(), EngineError>;

    /// Check out a branch, or detach HEAD at any other revision.
    async fn checkout(&self, dir: &Path, target: &str, force: bool) -> Result<(), EngineError>;

    /// The full status matrix of the working tree.
    async fn status_matrix(&self, dir: &Path) -> Result<Vec<StatusRow>, EngineError>;

    async fn merge(
        &self,
        dir: &Path,
        request: MergeRequest,
        author: Identity,
    ) -> Result<MergeReport, EngineError>;

    async fn log(&self, dir: &Path, request: LogRequest) -> Result<Vec<CommitInfo>, EngineError>;

    async fn read_commit(&self, dir: &Path, oid: &Oid) -> Result<CommitInfo, EngineError>;

    async fn read_blob(&self, dir: &Path, oid: &Oid) -> Result<Vec<u8>, EngineError>;

    /// Contents of `path` in the tree of commit `rev`.
    async fn read_blob_at(&self, dir: &Path, rev: &str, path: &str)
        -> Result<Vec<u8>, EngineError>;

    async fn write_blob(&self, dir: &Path, content: &[u8]) -> Result<Oid, EngineError>;

    /// Blob id of `content` without writing it anywhere.
    async fn hash_blob(&self, content: &[u8]) -> Result<Oid, EngineError>;

    /// All values of `key`, in the order the config lists them.
    async fn get_config(&self, dir: &Path, key: &str) -> Result<Vec<String>, EngineError>;

    /// Set `key`, or add another value when `append`.
    async fn set_config(
        &self,
        dir: &Path,
        key: &str,
        value: &str,
        append: bool,
    ) -> Result<(), EngineError>;

    async fn list_config(&self, dir: &Path) -> Result<Vec<(String, String)>, EngineError>;

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), EngineError>;

    async fn delete_remote(&self, dir: &Path, name: &str) -> Result<(), EngineError>;

    /// Lightweight tag at `target` (HEAD when `None`).
    async fn create_tag(
        &self,
        dir: &Path,
        name: &str,
        target: Option<&str>,
    ) -> Result<(), EngineError>;

    async fn create_annotated_tag(
        &self,
        dir: &Path,
        request: AnnotatedTagRequest,
        tagger: Identity,
    ) -> Result<(), EngineError>;
}
