//! client::results
//!
//! Result summaries returned by façade operations.
//!
//! Field names follow the familiar client library so the summaries can be
//! serialized to the JSON shapes its consumers expect. Status and merge
//! results live with their classifiers in [`crate::core`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::types::{Identity, Oid};
use crate::engine::{CommitInfo, RefUpdate};

/// Outcome of [`GitClient::init`](super::GitClient::init).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitResult {
    pub path: PathBuf,
    pub bare: bool,
    /// A repository was already present.
    pub existing: bool,
}

/// One commit in a log listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub hash: Oid,
    pub date: chrono::DateTime<chrono::Utc>,
    /// Subject line.
    pub message: String,
    /// Message after the subject line.
    pub body: String,
    pub author_name: String,
    pub author_email: String,
}

impl From<CommitInfo> for LogEntry {
    fn from(info: CommitInfo) -> Self {
        let body = info
            .message
            .split_once('\n')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();
        Self {
            hash: info.oid,
            date: info.author_time,
            message: info.summary,
            body,
            author_name: info.author_name,
            author_email: info.author_email,
        }
    }
}

/// Outcome of [`GitClient::log`](super::GitClient::log).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogResult {
    pub all: Vec<LogEntry>,
    pub latest: Option<LogEntry>,
    pub total: usize,
}

impl LogResult {
    pub fn new(all: Vec<LogEntry>) -> Self {
        Self {
            latest: all.first().cloned(),
            total: all.len(),
            all,
        }
    }
}

/// Outcome of [`GitClient::commit`](super::GitClient::commit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    /// Branch the commit landed on; `HEAD` when detached.
    pub branch: String,
    pub commit: Oid,
    /// The commit has no parents.
    pub root: bool,
    pub author: Identity,
}

/// One branch in a [`BranchSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSummaryBranch {
    pub current: bool,
    pub name: String,
    /// Abbreviated tip commit.
    pub commit: String,
    /// Tip commit subject.
    pub label: String,
}

/// Outcome of [`GitClient::branch`](super::GitClient::branch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchSummary {
    pub detached: bool,
    pub current: String,
    pub all: Vec<String>,
    pub branches: BTreeMap<String, BranchSummaryBranch>,
}

/// Outcome of deleting one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchDeletionResult {
    pub branch: String,
    /// Tip of the branch before deletion.
    pub hash: Option<Oid>,
    pub success: bool,
    /// Failure message when `success` is false.
    pub error: Option<String>,
}

/// Outcome of [`GitClient::delete_local_branches`](super::GitClient::delete_local_branches).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchMultiDeleteResult {
    /// Every attempt, in input order.
    pub all: Vec<BranchDeletionResult>,
    pub branches: BTreeMap<String, BranchDeletionResult>,
    /// The failed attempts, in input order.
    pub errors: Vec<BranchDeletionResult>,
    /// No attempt failed.
    pub success: bool,
}

impl BranchMultiDeleteResult {
    pub(crate) fn record(&mut self, outcome: BranchDeletionResult) {
        if !outcome.success {
            self.errors.push(outcome.clone());
        }
        self.branches
            .insert(outcome.branch.clone(), outcome.clone());
        self.all.push(outcome);
        self.success = self.errors.is_empty();
    }
}

/// Fetch and push URLs of a remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRefs {
    pub fetch: String,
    pub push: String,
}

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteWithRefs {
    pub name: String,
    /// Present only in the verbose listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refs: Option<RemoteRefs>,
}

/// Outcome of [`GitClient::fetch`](super::GitClient::fetch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub remote: String,
    pub branch: Option<String>,
    /// Fetched tip of `branch`.
    pub fetch_head: Option<Oid>,
}

/// Outcome of [`GitClient::push`](super::GitClient::push).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushResult {
    pub remote: String,
    pub ok: bool,
    pub refs: Vec<RefUpdate>,
}

/// One tag that failed to push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPushFailure {
    pub tag: String,
    pub message: String,
}

/// Outcome of [`GitClient::push_tags`](super::GitClient::push_tags).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushTagsResult {
    pub remote: String,
    pub pushed: Vec<String>,
    pub failed: Vec<TagPushFailure>,
    pub success: bool,
}

/// Outcome of [`GitClient::tags`](super::GitClient::tags).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagResult {
    pub all: Vec<String>,
    /// Last tag in listing order.
    pub latest: Option<String>,
}

impl TagResult {
    pub fn new(all: Vec<String>) -> Self {
        Self {
            latest: all.last().cloned(),
            all,
        }
    }
}

/// Outcome of [`GitClient::get_config`](super::GitClient::get_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigGetResult {
    pub key: String,
    /// Effective value (the last one set), if any.
    pub value: Option<String>,
    pub values: Vec<String>,
}

/// A config value; keys set more than once list every value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Single(String),
    Multi(Vec<String>),
}

/// Outcome of [`GitClient::list_config`](super::GitClient::list_config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigListSummary {
    pub all: BTreeMap<String, ConfigValue>,
}

impl ConfigListSummary {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut all: BTreeMap<String, ConfigValue> = BTreeMap::new();
        for (key, value) in pairs {
            let merged = match all.remove(&key) {
                None => ConfigValue::Single(value),
                Some(ConfigValue::Single(first)) => ConfigValue::Multi(vec![first, value]),
                Some(ConfigValue::Multi(mut values)) => {
                    values.push(value);
                    ConfigValue::Multi(values)
                }
            };
            all.insert(key, merged);
        }
        Self { all }
    }
}
