//! client::unsupported
//!
//! Operations kept in the façade for interface compatibility only.
//!
//! None of these has a safe equivalent among the engine primitives. Each
//! method accepts the consumer's arguments and fails immediately with
//! [`ClientError::Unsupported`]; the engine is never called, so callers can
//! rely on the operation not having been attempted.

use std::fmt;

use serde::Serialize;

use super::error::{ClientError, UnsupportedError};
use super::GitClient;

/// The fixed set of operations the façade refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedOperation {
    ApplyPatch,
    Clean,
    Diff,
    DiffSummary,
    Raw,
    Rebase,
    Stash,
    StashList,
    SubmoduleAdd,
    Mirror,
    CountObjects,
    UpdateServerInfo,
    Mv,
}

impl UnsupportedOperation {
    pub const ALL: [UnsupportedOperation; 13] = [
        UnsupportedOperation::ApplyPatch,
        UnsupportedOperation::Clean,
        UnsupportedOperation::Diff,
        UnsupportedOperation::DiffSummary,
        UnsupportedOperation::Raw,
        UnsupportedOperation::Rebase,
        UnsupportedOperation::Stash,
        UnsupportedOperation::StashList,
        UnsupportedOperation::SubmoduleAdd,
        UnsupportedOperation::Mirror,
        UnsupportedOperation::CountObjects,
        UnsupportedOperation::UpdateServerInfo,
        UnsupportedOperation::Mv,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnsupportedOperation::ApplyPatch => "apply_patch",
            UnsupportedOperation::Clean => "clean",
            UnsupportedOperation::Diff => "diff",
            UnsupportedOperation::DiffSummary => "diff_summary",
            UnsupportedOperation::Raw => "raw",
            UnsupportedOperation::Rebase => "rebase",
            UnsupportedOperation::Stash => "stash",
            UnsupportedOperation::StashList => "stash_list",
            UnsupportedOperation::SubmoduleAdd => "submodule_add",
            UnsupportedOperation::Mirror => "mirror",
            UnsupportedOperation::CountObjects => "count_objects",
            UnsupportedOperation::UpdateServerInfo => "update_server_info",
            UnsupportedOperation::Mv => "mv",
        }
    }
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(super) fn refuse<T>(op: UnsupportedOperation) -> Result<T, ClientError> {
    tracing::debug!(operation = %op, "refusing unsupported operation");
    Err(UnsupportedError::operation(op).into())
}

impl GitClient {
    pub async fn apply_patch(&self, _patches: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::ApplyPatch)
    }

    pub async fn clean(&self, _mode: &str, _options: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Clean)
    }

    pub async fn diff(&self, _options: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Diff)
    }

    pub async fn diff_summary(&self, _options: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::DiffSummary)
    }

    pub async fn raw(&self, _args: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Raw)
    }

    pub async fn rebase(&self, _options: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Rebase)
    }

    pub async fn stash(&self, _options: &[String]) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Stash)
    }

    pub async fn stash_list(&self, _options: &[String]) -> Result<Vec<String>, ClientError> {
        refuse(UnsupportedOperation::StashList)
    }

    pub async fn submodule_add(&self, _repo: &str, _path: &str) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::SubmoduleAdd)
    }

    pub async fn mirror(&self, _repo: &str, _local_path: &str) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Mirror)
    }

    pub async fn count_objects(&self) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::CountObjects)
    }

    pub async fn update_server_info(&self) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::UpdateServerInfo)
    }

    pub async fn mv(&self, _from: &[String], _to: &str) -> Result<String, ClientError> {
        refuse(UnsupportedOperation::Mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = UnsupportedOperation::ALL.iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), UnsupportedOperation::ALL.len());
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&UnsupportedOperation::DiffSummary).unwrap();
        assert_eq!(json, "\"diff_summary\"");
    }
}
