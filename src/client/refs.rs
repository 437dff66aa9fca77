//! client::refs
//!
//! Branch, checkout, merge, and tag operations.

use super::error::{ClientError, UnsupportedError};
use super::options::{BranchOptions, MergeOptions};
use super::results::{
    BranchDeletionResult, BranchMultiDeleteResult, BranchSummary, BranchSummaryBranch, TagResult,
};
use super::GitClient;
use crate::core::merge::MergeSummary;
use crate::core::status::DETACHED_PLACEHOLDER;
use crate::core::types::Oid;
use crate::engine::{AnnotatedTagRequest, EngineError, MergeRequest};

impl GitClient {
    // =========================================================================
    // Branches
    // =========================================================================

    /// List branches with their tip commits.
    ///
    /// With `options.remote` set, lists that remote's tracking branches as
    /// `<remote>/<branch>`.
    pub async fn branch(&self, options: BranchOptions) -> Result<BranchSummary, ClientError> {
        tracing::debug!(dir = %self.dir.display(), remote = ?options.remote, "branch");

        let current = self.engine.current_branch(&self.dir).await?;
        let names = self
            .engine
            .list_branches(&self.dir, options.remote.as_deref())
            .await?;

        let mut summary = BranchSummary {
            detached: current.is_none(),
            current: current
                .clone()
                .unwrap_or_else(|| DETACHED_PLACEHOLDER.to_string()),
            ..Default::default()
        };

        for short in names {
            let (name, refname) = match &options.remote {
                Some(remote) => (
                    format!("{remote}/{short}"),
                    format!("refs/remotes/{remote}/{short}"),
                ),
                None => (short.clone(), format!("refs/heads/{short}")),
            };
            let oid = self.engine.resolve_ref(&self.dir, &refname).await?;
            let info = self.engine.read_commit(&self.dir, &oid).await?;

            summary.branches.insert(
                name.clone(),
                BranchSummaryBranch {
                    current: options.remote.is_none() && current.as_deref() == Some(short.as_str()),
                    name: name.clone(),
                    commit: oid.short(7).to_string(),
                    label: info.summary,
                },
            );
            summary.all.push(name);
        }

        Ok(summary)
    }

    /// List local branches.
    pub async fn branch_local(&self) -> Result<BranchSummary, ClientError> {
        self.branch(BranchOptions::default()).await
    }

    /// Check out a branch or revision.
    pub async fn checkout(&self, target: &str) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), target, "checkout");
        Ok(self.engine.checkout(&self.dir, target, false).await?)
    }

    /// Create `name` at `start_point` and check it out.
    pub async fn checkout_branch(&self, name: &str, start_point: &str) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, start_point, "checkout -b");
        Ok(self
            .engine
            .create_branch(&self.dir, name, Some(start_point), true)
            .await?)
    }

    /// Create `name` at `HEAD` and check it out.
    pub async fn checkout_local_branch(&self, name: &str) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, "checkout -b");
        Ok(self.engine.create_branch(&self.dir, name, None, true).await?)
    }

    async fn delete_branch_at_tip(&self, name: &str) -> Result<Oid, EngineError> {
        let hash = self
            .engine
            .resolve_ref(&self.dir, &format!("refs/heads/{name}"))
            .await?;
        self.engine.delete_branch(&self.dir, name).await?;
        Ok(hash)
    }

    /// Delete one local branch.
    pub async fn delete_local_branch(&self, name: &str) -> Result<BranchDeletionResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, "branch -d");
        let hash = self.delete_branch_at_tip(name).await?;
        Ok(BranchDeletionResult {
            branch: name.to_string(),
            hash: Some(hash),
            success: true,
            error: None,
        })
    }

    /// Delete local branches one at a time, in order.
    ///
    /// A failure is recorded and the remaining branches are still attempted.
    pub async fn delete_local_branches<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BranchMultiDeleteResult, ClientError> {
        let mut result = BranchMultiDeleteResult {
            success: true,
            ..Default::default()
        };

        for name in names {
            let name = name.as_ref();
            tracing::debug!(dir = %self.dir.display(), name, "branch -d");

            let outcome = match self.delete_branch_at_tip(name).await {
                Ok(hash) => BranchDeletionResult {
                    branch: name.to_string(),
                    hash: Some(hash),
                    success: true,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(branch = name, error = %err, "branch deletion failed");
                    BranchDeletionResult {
                        branch: name.to_string(),
                        hash: None,
                        success: false,
                        error: Some(err.to_string()),
                    }
                }
            };
            result.record(outcome);
        }

        Ok(result)
    }

    // =========================================================================
    // Merge
    // =========================================================================

    /// Merge `options.from` into `options.into` (default: the current branch).
    ///
    /// Fails with an unsupported error, before any engine call, when no
    /// source branch is given. A conflicting merge surfaces the engine's
    /// error.
    pub async fn merge(&self, options: MergeOptions) -> Result<MergeSummary, ClientError> {
        let Some(from) = options.from else {
            return Err(UnsupportedError::branch_not_specified().into());
        };
        tracing::debug!(
            dir = %self.dir.display(),
            from = %from,
            into = ?options.into,
            "merge"
        );

        let report = self
            .engine
            .merge(
                &self.dir,
                MergeRequest {
                    ours: options.into,
                    theirs: from,
                    fast_forward_only: options.fast_forward_only,
                    message: options.message,
                },
                self.identity.clone(),
            )
            .await?;
        self.summarize_merge(report).await
    }

    /// Merge `from` into `to`.
    pub async fn merge_from_to(&self, from: &str, to: &str) -> Result<MergeSummary, ClientError> {
        self.merge(MergeOptions {
            from: Some(from.to_string()),
            into: Some(to.to_string()),
            ..Default::default()
        })
        .await
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// All tags, sorted by name.
    pub async fn tags(&self) -> Result<TagResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), "tag -l");
        let tags = self.engine.list_tags(&self.dir).await?;
        Ok(TagResult::new(tags))
    }

    /// Create a lightweight tag at `HEAD`.
    pub async fn add_tag(&self, name: &str) -> Result<String, ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, "tag");
        self.engine.create_tag(&self.dir, name, None).await?;
        Ok(name.to_string())
    }

    /// Create an annotated tag at `HEAD`, tagged by the handle identity.
    pub async fn add_annotated_tag(&self, name: &str, message: &str) -> Result<String, ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, "tag -a");
        self.engine
            .create_annotated_tag(
                &self.dir,
                AnnotatedTagRequest {
                    name: name.to_string(),
                    message: message.to_string(),
                    target: None,
                },
                self.identity.clone(),
            )
            .await?;
        Ok(name.to_string())
    }
}

