//! client::options
//!
//! Named optional arguments for façade operations.
//!
//! Each operation with optional arguments takes one of these structs. All
//! derive `Default`, so callers set only what they need:
//!
//! ```
//! use gitshim::client::options::LogOptions;
//!
//! let options = LogOptions { max_count: Some(5), ..Default::default() };
//! assert!(options.from.is_none());
//! ```

use crate::core::types::Identity;

/// Options for [`GitClient::init`](super::GitClient::init).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub bare: bool,
    /// Initial branch; the configured default when `None`.
    pub initial_branch: Option<String>,
}

/// What [`GitClient::check_is_repo`](super::GitClient::check_is_repo) checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckRepoAction {
    /// The directory is inside a repository.
    #[default]
    IsRepo,
    /// The directory is the root of a repository.
    IsRepoRoot,
}

/// Options for [`GitClient::clone`](super::GitClient::clone).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    pub branch: Option<String>,
    /// Shallow clone depth.
    pub depth: Option<u32>,
    pub single_branch: bool,
    pub no_checkout: bool,
    /// Mirror clones are unsupported; setting this fails the clone.
    pub mirror: bool,
}

/// Options for [`GitClient::log`](super::GitClient::log).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Starting revision; `HEAD` when `None`.
    pub from: Option<String>,
    pub max_count: Option<usize>,
}

/// Options for [`GitClient::commit`](super::GitClient::commit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Paths to stage before committing.
    pub files: Vec<String>,
    /// Author for this commit only; the handle identity when `None`.
    pub author: Option<Identity>,
    pub amend: bool,
}

/// Options for [`GitClient::branch`](super::GitClient::branch).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchOptions {
    /// List this remote's tracking branches instead of local branches.
    pub remote: Option<String>,
}

/// Options for [`GitClient::merge`](super::GitClient::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Branch or revision to merge. Required.
    pub from: Option<String>,
    /// Branch to merge into; the current branch when `None`.
    pub into: Option<String>,
    pub fast_forward_only: bool,
    pub message: Option<String>,
}

/// Options for [`GitClient::fetch`](super::GitClient::fetch).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub tags: bool,
    pub prune: bool,
}

/// Options for [`GitClient::pull`](super::GitClient::pull).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub remote: Option<String>,
    /// Remote branch; the current branch when `None`.
    pub branch: Option<String>,
    pub fast_forward_only: bool,
}

/// Options for [`GitClient::push`](super::GitClient::push).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub remote: Option<String>,
    /// Branch to push; the current branch when `None`.
    pub branch: Option<String>,
    pub force: bool,
    /// Delete the branch on the remote instead of updating it.
    pub delete: bool,
}
