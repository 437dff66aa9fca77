//! client::remote
//!
//! Remote management and transport: fetch, pull, push.

use super::error::ClientError;
use super::options::{FetchOptions, PullOptions, PushOptions};
use super::results::{
    FetchResult, PushResult, PushTagsResult, RemoteRefs, RemoteWithRefs, TagPushFailure,
};
use super::GitClient;
use crate::core::merge::MergeSummary;
use crate::core::types::{BranchName, RefName};
use crate::engine::{EngineError, FetchRequest, PullRequest, PushReport, PushRequest};

impl GitClient {
    // =========================================================================
    // Remotes
    // =========================================================================

    /// Configured remote names.
    pub async fn get_remotes(&self) -> Result<Vec<RemoteWithRefs>, ClientError> {
        self.remotes(false).await
    }

    /// Configured remotes with their fetch and push URLs.
    pub async fn get_remotes_verbose(&self) -> Result<Vec<RemoteWithRefs>, ClientError> {
        self.remotes(true).await
    }

    async fn remotes(&self, verbose: bool) -> Result<Vec<RemoteWithRefs>, ClientError> {
        tracing::debug!(dir = %self.dir.display(), verbose, "remote");
        let remotes = self.engine.list_remotes(&self.dir).await?;
        Ok(remotes
            .into_iter()
            .map(|remote| RemoteWithRefs {
                refs: verbose.then(|| RemoteRefs {
                    fetch: remote.url.clone(),
                    push: remote.url.clone(),
                }),
                name: remote.name,
            })
            .collect())
    }

    pub async fn add_remote(&self, name: &str, url: &str) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, url, "remote add");
        Ok(self.engine.add_remote(&self.dir, name, url).await?)
    }

    pub async fn remove_remote(&self, name: &str) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), name, "remote remove");
        Ok(self.engine.delete_remote(&self.dir, name).await?)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Fetch from a remote (default: the configured remote).
    pub async fn fetch(&self, options: FetchOptions) -> Result<FetchResult, ClientError> {
        let remote = self.remote_or_default(options.remote);
        tracing::debug!(
            dir = %self.dir.display(),
            remote = %remote,
            branch = ?options.branch,
            "fetch"
        );

        let report = self
            .engine
            .fetch(
                &self.dir,
                FetchRequest {
                    remote: remote.clone(),
                    branch: options.branch.clone(),
                    tags: options.tags,
                    prune: options.prune,
                },
                self.auth.clone(),
            )
            .await?;

        Ok(FetchResult {
            remote,
            branch: options.branch,
            fetch_head: report.fetch_head,
        })
    }

    /// Fetch and merge into the current branch.
    ///
    /// The outcome is classified like [`merge`](Self::merge).
    pub async fn pull(&self, options: PullOptions) -> Result<MergeSummary, ClientError> {
        let remote = self.remote_or_default(options.remote);
        tracing::debug!(
            dir = %self.dir.display(),
            remote = %remote,
            branch = ?options.branch,
            "pull"
        );

        let report = self
            .engine
            .pull(
                &self.dir,
                PullRequest {
                    remote,
                    branch: options.branch,
                    fast_forward_only: options.fast_forward_only,
                },
                self.identity.clone(),
                self.auth.clone(),
            )
            .await?;
        self.summarize_merge(report).await
    }

    /// Push a branch (default: the current branch) to a remote.
    pub async fn push(&self, options: PushOptions) -> Result<PushResult, ClientError> {
        let remote = self.remote_or_default(options.remote);
        let branch = match options.branch {
            Some(branch) => branch,
            None => self.require_branch().await?,
        };
        let reference = RefName::for_branch(&BranchName::new(branch).map_err(EngineError::from)?);
        tracing::debug!(
            dir = %self.dir.display(),
            remote = %remote,
            reference = %reference,
            force = options.force,
            delete = options.delete,
            "push"
        );

        let report = self
            .push_ref(&remote, reference.as_str(), options.force, options.delete)
            .await?;
        Ok(PushResult {
            remote,
            ok: report.ok,
            refs: report.refs,
        })
    }

    /// Push every tag, one at a time in listing order.
    ///
    /// A failed tag is recorded and the remaining tags are still pushed.
    pub async fn push_tags(&self, remote: Option<&str>) -> Result<PushTagsResult, ClientError> {
        let remote = self.remote_or_default(remote.map(str::to_string));
        tracing::debug!(dir = %self.dir.display(), remote = %remote, "push --tags");

        let tags = self.engine.list_tags(&self.dir).await?;
        let mut result = PushTagsResult {
            remote: remote.clone(),
            ..Default::default()
        };

        for tag in tags {
            let outcome = match RefName::for_tag(&tag) {
                Ok(reference) => self.push_ref(&remote, reference.as_str(), false, false).await,
                Err(err) => Err(err.into()),
            };
            let failure = match outcome {
                Ok(report) if report.ok => None,
                Ok(report) => Some(
                    report
                        .refs
                        .into_iter()
                        .find_map(|r| r.error)
                        .unwrap_or_else(|| "rejected".to_string()),
                ),
                Err(err) => Some(err.to_string()),
            };

            match failure {
                None => result.pushed.push(tag),
                Some(message) => {
                    tracing::warn!(tag = %tag, error = %message, "tag push failed");
                    result.failed.push(TagPushFailure { tag, message });
                }
            }
        }

        result.success = result.failed.is_empty();
        Ok(result)
    }

    async fn push_ref(
        &self,
        remote: &str,
        reference: &str,
        force: bool,
        delete: bool,
    ) -> Result<PushReport, EngineError> {
        self.engine
            .push(
                &self.dir,
                PushRequest {
                    remote: remote.to_string(),
                    reference: reference.to_string(),
                    force,
                    delete,
                },
                self.auth.clone(),
            )
            .await
    }
}
