//! client::repository
//!
//! Repository setup, status, history, index, commit, config, and object
//! operations.

use std::path::{Path, PathBuf};

use super::error::ClientError;
use super::options::{CheckRepoAction, CloneOptions, CommitOptions, InitOptions, LogOptions};
use super::results::{
    CommitResult, ConfigGetResult, ConfigListSummary, InitResult, LogEntry, LogResult,
};
use super::unsupported::{refuse, UnsupportedOperation};
use super::GitClient;
use crate::core::status::{classify_status, StatusResult};
use crate::core::types::Oid;
use crate::engine::{CloneRequest, CommitInfo, CommitRequest, InitRequest, LogRequest};

/// Compare paths, canonicalizing when both exist.
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl GitClient {
    // =========================================================================
    // Repository
    // =========================================================================

    /// Initialize a repository in the working directory.
    ///
    /// An existing repository rooted here is left untouched and reported
    /// with `existing: true`.
    pub async fn init(&self, options: InitOptions) -> Result<InitResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), bare = options.bare, "init");

        let existing = self.check_is_repo(CheckRepoAction::IsRepoRoot).await?;
        if !existing {
            let default_branch = options
                .initial_branch
                .unwrap_or_else(|| self.init_branch.clone());
            self.engine
                .init(
                    &self.dir,
                    InitRequest {
                        bare: options.bare,
                        default_branch,
                    },
                )
                .await?;
        }

        Ok(InitResult {
            path: self.dir.clone(),
            bare: options.bare,
            existing,
        })
    }

    /// Whether the working directory is in (or is the root of) a repository.
    ///
    /// Never fails: any engine error means "no".
    pub async fn check_is_repo(&self, action: CheckRepoAction) -> Result<bool, ClientError> {
        match self.engine.find_root(&self.dir).await {
            Ok(root) => Ok(match action {
                CheckRepoAction::IsRepo => true,
                CheckRepoAction::IsRepoRoot => same_path(&root, &self.dir),
            }),
            Err(err) => {
                tracing::warn!(
                    dir = %self.dir.display(),
                    error = %err,
                    "repository probe failed; treating as not a repository"
                );
                Ok(false)
            }
        }
    }

    /// Clone `url` into `local_path` (relative to the working directory).
    ///
    /// Returns the path of the new repository. Mirror clones are refused.
    pub async fn clone(
        &self,
        url: &str,
        local_path: impl AsRef<Path>,
        options: CloneOptions,
    ) -> Result<PathBuf, ClientError> {
        if options.mirror {
            return refuse(UnsupportedOperation::Mirror);
        }

        let dir = self.dir.join(local_path);
        tracing::debug!(url, dir = %dir.display(), "clone");

        self.engine
            .clone_repo(
                CloneRequest {
                    url: url.to_string(),
                    dir: dir.clone(),
                    branch: options.branch,
                    depth: options.depth,
                    single_branch: options.single_branch,
                    no_checkout: options.no_checkout,
                },
                self.auth.clone(),
            )
            .await?;
        Ok(dir)
    }

    // =========================================================================
    // Status and History
    // =========================================================================

    /// Classify the working tree.
    ///
    /// `conflicted` and `ignored` are always empty, and `ahead`, `behind`,
    /// and `tracking` are not computed.
    pub async fn status(&self) -> Result<StatusResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), "status");
        let rows = self.engine.status_matrix(&self.dir).await?;
        let branch = self.engine.current_branch(&self.dir).await?;
        Ok(classify_status(&rows, branch.as_deref()))
    }

    /// Commits reachable from `options.from` (default `HEAD`), newest first.
    pub async fn log(&self, options: LogOptions) -> Result<LogResult, ClientError> {
        let reference = options.from.unwrap_or_else(|| "HEAD".to_string());
        tracing::debug!(dir = %self.dir.display(), %reference, "log");

        let commits = self
            .engine
            .log(
                &self.dir,
                LogRequest {
                    reference,
                    depth: options.max_count,
                },
            )
            .await?;
        Ok(LogResult::new(
            commits.into_iter().map(LogEntry::from).collect(),
        ))
    }

    /// The commit a revision names.
    pub async fn show_commit(&self, rev: &str) -> Result<CommitInfo, ClientError> {
        tracing::debug!(dir = %self.dir.display(), rev, "show commit");
        let oid = self.engine.resolve_ref(&self.dir, rev).await?;
        Ok(self.engine.read_commit(&self.dir, &oid).await?)
    }

    /// Raw content of a blob, named by id or revision.
    pub async fn cat_file(&self, object: &str) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(dir = %self.dir.display(), object, "cat-file");
        let oid = self.engine.resolve_ref(&self.dir, object).await?;
        Ok(self.engine.read_blob(&self.dir, &oid).await?)
    }

    /// Content of `path` as of `rev`, decoded lossily as UTF-8.
    pub async fn show_file(&self, rev: &str, path: &str) -> Result<String, ClientError> {
        tracing::debug!(dir = %self.dir.display(), rev, path, "show file");
        let bytes = self.engine.read_blob_at(&self.dir, rev, path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolve a revision to an object id.
    pub async fn revparse(&self, rev: &str) -> Result<Oid, ClientError> {
        tracing::debug!(dir = %self.dir.display(), rev, "rev-parse");
        Ok(self.engine.resolve_ref(&self.dir, rev).await?)
    }

    // =========================================================================
    // Index and Commits
    // =========================================================================

    /// Stage files, one at a time in order. Stops at the first failure.
    pub async fn add<S: AsRef<str>>(&self, files: &[S]) -> Result<(), ClientError> {
        for file in files {
            let file = file.as_ref();
            tracing::debug!(dir = %self.dir.display(), file, "add");
            self.engine.add(&self.dir, file).await?;
        }
        Ok(())
    }

    /// Remove files from the index and the working tree.
    pub async fn rm<S: AsRef<str>>(&self, files: &[S]) -> Result<(), ClientError> {
        self.remove_files(files, false).await
    }

    /// Remove files from the index only.
    pub async fn rm_keep_local<S: AsRef<str>>(&self, files: &[S]) -> Result<(), ClientError> {
        self.remove_files(files, true).await
    }

    async fn remove_files<S: AsRef<str>>(
        &self,
        files: &[S],
        keep_local: bool,
    ) -> Result<(), ClientError> {
        for file in files {
            let file = file.as_ref();
            tracing::debug!(dir = %self.dir.display(), file, keep_local, "rm");
            self.engine.remove(&self.dir, file, keep_local).await?;
        }
        Ok(())
    }

    /// Commit the index, staging `options.files` first.
    pub async fn commit(
        &self,
        message: &str,
        options: CommitOptions,
    ) -> Result<CommitResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), amend = options.amend, "commit");

        self.add(&options.files).await?;

        let author = options.author.unwrap_or_else(|| self.identity.clone());
        let commit = self
            .engine
            .commit(
                &self.dir,
                CommitRequest {
                    message: message.to_string(),
                    author: author.clone(),
                    amend: options.amend,
                },
            )
            .await?;
        let info = self.engine.read_commit(&self.dir, &commit).await?;
        let branch = self.branch_label().await?;

        Ok(CommitResult {
            branch,
            commit,
            root: info.parents.is_empty(),
            author,
        })
    }

    // =========================================================================
    // Config
    // =========================================================================

    /// Set a repository config value, or add another value when `append`.
    pub async fn add_config(&self, key: &str, value: &str, append: bool) -> Result<(), ClientError> {
        tracing::debug!(dir = %self.dir.display(), key, append, "config set");
        Ok(self.engine.set_config(&self.dir, key, value, append).await?)
    }

    /// All values of a config key; `value` is the effective (last) one.
    pub async fn get_config(&self, key: &str) -> Result<ConfigGetResult, ClientError> {
        tracing::debug!(dir = %self.dir.display(), key, "config get");
        let values = self.engine.get_config(&self.dir, key).await?;
        Ok(ConfigGetResult {
            key: key.to_string(),
            value: values.last().cloned(),
            values,
        })
    }

    /// Every config entry visible from the repository.
    pub async fn list_config(&self) -> Result<ConfigListSummary, ClientError> {
        tracing::debug!(dir = %self.dir.display(), "config list");
        let pairs = self.engine.list_config(&self.dir).await?;
        Ok(ConfigListSummary::from_pairs(pairs))
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Blob id of `content`, storing the blob when `write` is set.
    pub async fn hash_object(&self, content: &[u8], write: bool) -> Result<Oid, ClientError> {
        tracing::debug!(dir = %self.dir.display(), len = content.len(), write, "hash-object");
        let oid = if write {
            self.engine.write_blob(&self.dir, content).await?
        } else {
            self.engine.hash_blob(content).await?
        };
        Ok(oid)
    }
}
