//! engine::mock
//!
//! In-memory engine for deterministic testing.
//!
//! # Design
//!
//! The mock keeps branches, tags, remotes, config, and commits in memory.
//! The working tree is a map of path to bytes written with
//! [`MockEngine::write_file`]; `add` copies into the index and `commit`
//! snapshots the index. The status matrix and merge outcome are scripted
//! with [`MockEngine::set_status`] and [`MockEngine::set_merge_report`].
//! Failures are injected per primitive (optionally per target) with
//! [`MockEngine::fail_on`], and every call is recorded for verification.
//!
//! # Example
//!
//! ```
//! use gitshim::engine::mock::MockEngine;
//! use gitshim::engine::Engine;
//! use std::path::Path;
//!
//! # tokio_test::block_on(async {
//! let engine = MockEngine::with_repo("main");
//! engine.write_file("a.txt", b"hello");
//!
//! let dir = Path::new("/repo");
//! engine.add(dir, "a.txt").await.unwrap();
//! let oid = engine
//!     .commit(dir, gitshim::engine::CommitRequest {
//!         message: "first".into(),
//!         author: Default::default(),
//!         amend: false,
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(engine.resolve_ref(dir, "main").await.unwrap(), oid);
//! assert_eq!(engine.calls_to("commit").len(), 1);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{
    AnnotatedTagRequest, CloneRequest, CommitInfo, CommitRequest, Credentials, Engine,
    EngineError, FetchReport, FetchRequest, InitRequest, LogRequest, MergeRequest, PullRequest,
    PushReport, PushRequest, RefUpdate, RemoteInfo,
};
use crate::core::merge::MergeReport;
use crate::core::status::StatusRow;
use crate::core::types::{Identity, Oid};

/// Mock engine for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

#[derive(Debug, Default)]
struct MockEngineInner {
    initialized: bool,
    root: Option<PathBuf>,
    /// Current branch; `None` with `detached` set means detached HEAD.
    head: Option<String>,
    detached: Option<Oid>,
    branches: BTreeMap<String, Oid>,
    remote_branches: BTreeMap<String, BTreeMap<String, Oid>>,
    tags: BTreeMap<String, Oid>,
    remotes: BTreeMap<String, String>,
    config: BTreeMap<String, Vec<String>>,
    commits: HashMap<Oid, MockCommit>,
    blobs: HashMap<Oid, Vec<u8>>,
    workdir: BTreeMap<String, Vec<u8>>,
    index: BTreeMap<String, Vec<u8>>,
    status: Vec<StatusRow>,
    merge_report: Option<MergeReport>,
    next_id: u64,
    failures: HashMap<(String, Option<String>), EngineError>,
    calls: Vec<MockCall>,
}

#[derive(Debug, Clone)]
struct MockCommit {
    info: CommitInfo,
    tree: BTreeMap<String, Vec<u8>>,
}

/// A recorded primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Primitive name, e.g. `"delete_branch"`
    pub primitive: &'static str,
    /// Working directory passed to the primitive
    pub dir: Option<PathBuf>,
    /// The primitive's main argument, if it has one
    pub target: Option<String>,
}

impl MockEngine {
    /// Create an engine with no repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with an initialized, empty repository on `branch`.
    pub fn with_repo(branch: &str) -> Self {
        let engine = Self::new();
        {
            let mut inner = engine.lock();
            inner.initialized = true;
            inner.head = Some(branch.to_string());
        }
        engine
    }

    fn lock(&self) -> MutexGuard<'_, MockEngineInner> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Report `root` from `find_root` instead of the caller's directory.
    pub fn set_root(&self, root: impl Into<PathBuf>) {
        self.lock().root = Some(root.into());
    }

    /// Write a file into the mock working tree.
    pub fn write_file(&self, path: &str, content: &[u8]) {
        self.lock().workdir.insert(path.to_string(), content.to_vec());
    }

    /// Whether a file exists in the mock working tree.
    pub fn has_file(&self, path: &str) -> bool {
        self.lock().workdir.contains_key(path)
    }

    /// Script the rows returned by `status_matrix`.
    pub fn set_status(&self, rows: Vec<StatusRow>) {
        self.lock().status = rows;
    }

    /// Script the report returned by `merge` and `pull`.
    pub fn set_merge_report(&self, report: MergeReport) {
        self.lock().merge_report = Some(report);
    }

    /// Add a remote-tracking branch.
    pub fn add_remote_branch(&self, remote: &str, branch: &str, oid: Oid) {
        self.lock()
            .remote_branches
            .entry(remote.to_string())
            .or_default()
            .insert(branch.to_string(), oid);
    }

    /// Fail every call to `primitive`, or only calls whose main argument is
    /// `target`.
    pub fn fail_on(&self, primitive: &str, target: Option<&str>, error: EngineError) {
        self.lock().failures.insert(
            (primitive.to_string(), target.map(str::to_string)),
            error,
        );
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls to one primitive.
    pub fn calls_to(&self, primitive: &str) -> Vec<MockCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.primitive == primitive)
            .cloned()
            .collect()
    }

    /// Record a call and return the injected failure for it, if any.
    fn enter(
        &self,
        primitive: &'static str,
        dir: Option<&Path>,
        target: Option<&str>,
    ) -> Result<MutexGuard<'_, MockEngineInner>, EngineError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall {
            primitive,
            dir: dir.map(Path::to_path_buf),
            target: target.map(str::to_string),
        });

        let targeted = (primitive.to_string(), target.map(str::to_string));
        let any = (primitive.to_string(), None);
        if let Some(err) = inner.failures.get(&targeted).or_else(|| inner.failures.get(&any)) {
            return Err(err.clone());
        }
        Ok(inner)
    }

    /// Like [`enter`](Self::enter), but also requires an initialized repository.
    fn enter_repo(
        &self,
        primitive: &'static str,
        dir: &Path,
        target: Option<&str>,
    ) -> Result<MutexGuard<'_, MockEngineInner>, EngineError> {
        let inner = self.enter(primitive, Some(dir), target)?;
        if !inner.initialized {
            return Err(EngineError::NotARepo {
                path: dir.to_path_buf(),
            });
        }
        Ok(inner)
    }
}

impl MockEngineInner {
    fn next_oid(&mut self) -> Oid {
        self.next_id += 1;
        // 40 hex digits
        Oid::new(format!("{:040x}", self.next_id)).unwrap_or_else(|_| unreachable!())
    }

    fn head_oid(&self) -> Option<Oid> {
        match &self.head {
            Some(branch) => self.branches.get(branch).cloned(),
            None => self.detached.clone(),
        }
    }

    fn resolve(&self, name: &str) -> Result<Oid, EngineError> {
        let not_found = || EngineError::RefNotFound {
            refname: name.to_string(),
        };

        if name == "HEAD" {
            return self.head_oid().ok_or_else(not_found);
        }
        let short = name
            .strip_prefix("refs/heads/")
            .or_else(|| name.strip_prefix("refs/tags/"))
            .unwrap_or(name);
        if let Some(oid) = self.branches.get(short).or_else(|| self.tags.get(short)) {
            return Ok(oid.clone());
        }
        let remote_ref = name.strip_prefix("refs/remotes/").unwrap_or(name);
        if let Some((remote, branch)) = remote_ref.split_once('/') {
            if let Some(oid) = self.remote_branches.get(remote).and_then(|b| b.get(branch)) {
                return Ok(oid.clone());
            }
        }
        if let Ok(oid) = Oid::new(name) {
            if self.commits.contains_key(&oid) || self.blobs.contains_key(&oid) {
                return Ok(oid);
            }
        }
        Err(not_found())
    }

    fn commit_info(&self, oid: &Oid) -> Result<&MockCommit, EngineError> {
        self.commits
            .get(oid)
            .ok_or_else(|| EngineError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }
}

/// Deterministic stand-in for git's blob hash (FNV-1a, zero padded).
fn fake_blob_id(content: &[u8]) -> Oid {
    let hash = content.iter().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
        (acc ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    });
    Oid::new(format!("{:040x}", hash)).unwrap_or_else(|_| unreachable!())
}

#[async_trait]
impl Engine for MockEngine {
    async fn find_root(&self, dir: &Path) -> Result<PathBuf, EngineError> {
        let inner = self.enter_repo("find_root", dir, None)?;
        Ok(inner.root.clone().unwrap_or_else(|| dir.to_path_buf()))
    }

    async fn init(&self, dir: &Path, request: InitRequest) -> Result<(), EngineError> {
        let mut inner = self.enter("init", Some(dir), Some(request.default_branch.as_str()))?;
        if !inner.initialized {
            inner.initialized = true;
            inner.head = Some(request.default_branch);
        }
        Ok(())
    }

    async fn clone_repo(
        &self,
        request: CloneRequest,
        _auth: Option<Credentials>,
    ) -> Result<(), EngineError> {
        let mut inner = self.enter(
            "clone",
            Some(request.dir.as_path()),
            Some(request.url.as_str()),
        )?;
        inner.initialized = true;
        inner.head = Some(request.branch.unwrap_or_else(|| "main".to_string()));
        inner.remotes.insert("origin".to_string(), request.url);
        Ok(())
    }

    async fn fetch(
        &self,
        dir: &Path,
        request: FetchRequest,
        _auth: Option<Credentials>,
    ) -> Result<FetchReport, EngineError> {
        let inner = self.enter_repo("fetch", dir, Some(request.remote.as_str()))?;
        if !inner.remotes.contains_key(&request.remote) {
            return Err(EngineError::RemoteNotFound {
                name: request.remote,
            });
        }
        let fetch_head = request.branch.as_ref().and_then(|branch| {
            inner
                .remote_branches
                .get(&request.remote)
                .and_then(|b| b.get(branch))
                .cloned()
        });
        Ok(FetchReport { fetch_head })
    }

    async fn pull(
        &self,
        dir: &Path,
        request: PullRequest,
        _author: Identity,
        _auth: Option<Credentials>,
    ) -> Result<MergeReport, EngineError> {
        let inner = self.enter_repo("pull", dir, Some(request.remote.as_str()))?;
        if !inner.remotes.contains_key(&request.remote) {
            return Err(EngineError::RemoteNotFound {
                name: request.remote,
            });
        }
        Ok(inner.merge_report.clone().unwrap_or(MergeReport {
            already_merged: true,
            ..Default::default()
        }))
    }

    async fn push(
        &self,
        dir: &Path,
        request: PushRequest,
        _auth: Option<Credentials>,
    ) -> Result<PushReport, EngineError> {
        let inner = self.enter_repo("push", dir, Some(request.reference.as_str()))?;
        if !inner.remotes.contains_key(&request.remote) {
            return Err(EngineError::RemoteNotFound {
                name: request.remote,
            });
        }
        Ok(PushReport {
            ok: true,
            refs: vec![RefUpdate {
                name: request.reference,
                ok: true,
                error: None,
            }],
        })
    }

    async fn add(&self, dir: &Path, path: &str) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("add", dir, Some(path))?;
        let content = inner.workdir.get(path).cloned();
        if let Some(content) = content {
            inner.index.insert(path.to_string(), content);
        } else if inner.index.remove(path).is_none() {
            return Err(EngineError::Io {
                message: format!("no such file: {path}"),
            });
        }
        Ok(())
    }

    async fn remove(&self, dir: &Path, path: &str, keep_local: bool) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("remove", dir, Some(path))?;
        inner.index.remove(path);
        if !keep_local {
            inner.workdir.remove(path);
        }
        Ok(())
    }

    async fn commit(&self, dir: &Path, request: CommitRequest) -> Result<Oid, EngineError> {
        let mut inner = self.enter_repo("commit", dir, None)?;
        let oid = inner.next_oid();

        let mut parents: Vec<Oid> = inner.head_oid().into_iter().collect();
        if request.amend {
            let head = parents.pop().ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })?;
            parents = inner.commit_info(&head)?.info.parents.clone();
        }

        let info = CommitInfo {
            oid: oid.clone(),
            summary: request.message.lines().next().unwrap_or("").to_string(),
            message: request.message,
            author_name: request.author.name,
            author_email: request.author.email,
            author_time: chrono::DateTime::from_timestamp(inner.next_id as i64 * 60, 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH),
            parents,
        };
        let tree = inner.index.clone();
        inner.commits.insert(oid.clone(), MockCommit { info, tree });

        match inner.head.clone() {
            Some(branch) => {
                inner.branches.insert(branch, oid.clone());
            }
            None => inner.detached = Some(oid.clone()),
        }
        Ok(oid)
    }

    async fn resolve_ref(&self, dir: &Path, name: &str) -> Result<Oid, EngineError> {
        let inner = self.enter_repo("resolve_ref", dir, Some(name))?;
        inner.resolve(name)
    }

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>, EngineError> {
        let inner = self.enter_repo("current_branch", dir, None)?;
        Ok(inner.head.clone())
    }

    async fn list_branches(
        &self,
        dir: &Path,
        remote: Option<&str>,
    ) -> Result<Vec<String>, EngineError> {
        let inner = self.enter_repo("list_branches", dir, remote)?;
        Ok(match remote {
            None => inner.branches.keys().cloned().collect(),
            Some(remote) => inner
                .remote_branches
                .get(remote)
                .map(|b| b.keys().cloned().collect())
                .unwrap_or_default(),
        })
    }

    async fn list_tags(&self, dir: &Path) -> Result<Vec<String>, EngineError> {
        let inner = self.enter_repo("list_tags", dir, None)?;
        Ok(inner.tags.keys().cloned().collect())
    }

    async fn list_remotes(&self, dir: &Path) -> Result<Vec<RemoteInfo>, EngineError> {
        let inner = self.enter_repo("list_remotes", dir, None)?;
        Ok(inner
            .remotes
            .iter()
            .map(|(name, url)| RemoteInfo {
                name: name.clone(),
                url: url.clone(),
            })
            .collect())
    }

    async fn create_branch(
        &self,
        dir: &Path,
        name: &str,
        start: Option<&str>,
        checkout: bool,
    ) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("create_branch", dir, Some(name))?;
        if inner.branches.contains_key(name) {
            return Err(EngineError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let oid = inner.resolve(start.unwrap_or("HEAD"))?;
        inner.branches.insert(name.to_string(), oid);
        if checkout {
            inner.head = Some(name.to_string());
            inner.detached = None;
        }
        Ok(())
    }

    async fn delete_branch(&self, dir: &Path, name: &str) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("delete_branch", dir, Some(name))?;
        inner
            .branches
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::RefNotFound {
                refname: format!("refs/heads/{name}"),
            })
    }

    async fn checkout(&self, dir: &Path, target: &str, _force: bool) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("checkout", dir, Some(target))?;
        if inner.branches.contains_key(target) {
            inner.head = Some(target.to_string());
            inner.detached = None;
        } else {
            let oid = inner.resolve(target)?;
            inner.head = None;
            inner.detached = Some(oid);
        }
        Ok(())
    }

    async fn status_matrix(&self, dir: &Path) -> Result<Vec<StatusRow>, EngineError> {
        let inner = self.enter_repo("status_matrix", dir, None)?;
        Ok(inner.status.clone())
    }

    async fn merge(
        &self,
        dir: &Path,
        request: MergeRequest,
        _author: Identity,
    ) -> Result<MergeReport, EngineError> {
        let inner = self.enter_repo("merge", dir, Some(request.theirs.as_str()))?;
        inner.resolve(&request.theirs)?;
        Ok(inner.merge_report.clone().unwrap_or_default())
    }

    async fn log(&self, dir: &Path, request: LogRequest) -> Result<Vec<CommitInfo>, EngineError> {
        let inner = self.enter_repo("log", dir, Some(request.reference.as_str()))?;
        let mut next = Some(inner.resolve(&request.reference)?);
        let mut commits = Vec::new();
        while let Some(oid) = next {
            if request.depth.is_some_and(|depth| commits.len() >= depth) {
                break;
            }
            let commit = inner.commit_info(&oid)?;
            next = commit.info.parents.first().cloned();
            commits.push(commit.info.clone());
        }
        Ok(commits)
    }

    async fn read_commit(&self, dir: &Path, oid: &Oid) -> Result<CommitInfo, EngineError> {
        let inner = self.enter_repo("read_commit", dir, Some(oid.as_str()))?;
        Ok(inner.commit_info(oid)?.info.clone())
    }

    async fn read_blob(&self, dir: &Path, oid: &Oid) -> Result<Vec<u8>, EngineError> {
        let inner = self.enter_repo("read_blob", dir, Some(oid.as_str()))?;
        inner
            .blobs
            .get(oid)
            .cloned()
            .ok_or_else(|| EngineError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    async fn read_blob_at(
        &self,
        dir: &Path,
        rev: &str,
        path: &str,
    ) -> Result<Vec<u8>, EngineError> {
        let inner = self.enter_repo("read_blob_at", dir, Some(path))?;
        let oid = inner.resolve(rev)?;
        inner
            .commit_info(&oid)?
            .tree
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::ObjectNotFound {
                oid: format!("{rev}:{path}"),
            })
    }

    async fn write_blob(&self, dir: &Path, content: &[u8]) -> Result<Oid, EngineError> {
        let mut inner = self.enter_repo("write_blob", dir, None)?;
        let oid = fake_blob_id(content);
        inner.blobs.insert(oid.clone(), content.to_vec());
        Ok(oid)
    }

    async fn hash_blob(&self, content: &[u8]) -> Result<Oid, EngineError> {
        drop(self.enter("hash_blob", None, None)?);
        Ok(fake_blob_id(content))
    }

    async fn get_config(&self, dir: &Path, key: &str) -> Result<Vec<String>, EngineError> {
        let inner = self.enter_repo("get_config", dir, Some(key))?;
        Ok(inner.config.get(key).cloned().unwrap_or_default())
    }

    async fn set_config(
        &self,
        dir: &Path,
        key: &str,
        value: &str,
        append: bool,
    ) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("set_config", dir, Some(key))?;
        let values = inner.config.entry(key.to_string()).or_default();
        if !append {
            values.clear();
        }
        values.push(value.to_string());
        Ok(())
    }

    async fn list_config(&self, dir: &Path) -> Result<Vec<(String, String)>, EngineError> {
        let inner = self.enter_repo("list_config", dir, None)?;
        Ok(inner
            .config
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.clone(), v.clone())))
            .collect())
    }

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("add_remote", dir, Some(name))?;
        if inner.remotes.contains_key(name) {
            return Err(EngineError::AlreadyExists {
                name: name.to_string(),
            });
        }
        inner.remotes.insert(name.to_string(), url.to_string());
        Ok(())
    }

    async fn delete_remote(&self, dir: &Path, name: &str) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("delete_remote", dir, Some(name))?;
        inner
            .remotes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::RemoteNotFound {
                name: name.to_string(),
            })
    }

    async fn create_tag(
        &self,
        dir: &Path,
        name: &str,
        target: Option<&str>,
    ) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("create_tag", dir, Some(name))?;
        if inner.tags.contains_key(name) {
            return Err(EngineError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let oid = inner.resolve(target.unwrap_or("HEAD"))?;
        inner.tags.insert(name.to_string(), oid);
        Ok(())
    }

    async fn create_annotated_tag(
        &self,
        dir: &Path,
        request: AnnotatedTagRequest,
        _tagger: Identity,
    ) -> Result<(), EngineError> {
        let mut inner = self.enter_repo("create_annotated_tag", dir, Some(request.name.as_str()))?;
        if inner.tags.contains_key(&request.name) {
            return Err(EngineError::AlreadyExists { name: request.name });
        }
        let oid = inner.resolve(request.target.as_deref().unwrap_or("HEAD"))?;
        inner.tags.insert(request.name, oid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> &'static Path {
        Path::new("/repo")
    }

    async fn commit(engine: &MockEngine, message: &str) -> Oid {
        engine
            .commit(
                dir(),
                CommitRequest {
                    message: message.into(),
                    author: Identity::default(),
                    amend: false,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn uninitialized_engine_is_not_a_repo() {
        let engine = MockEngine::new();
        let err = engine.find_root(dir()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotARepo { .. }));
    }

    #[tokio::test]
    async fn commits_chain_through_parents() {
        let engine = MockEngine::with_repo("main");
        let first = commit(&engine, "one").await;
        let second = commit(&engine, "two").await;

        let log = engine
            .log(
                dir(),
                LogRequest {
                    reference: "HEAD".into(),
                    depth: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].oid, second);
        assert_eq!(log[0].parents, vec![first]);
    }

    #[tokio::test]
    async fn targeted_failure_only_hits_target() {
        let engine = MockEngine::with_repo("main");
        commit(&engine, "one").await;
        engine.create_branch(dir(), "a", None, false).await.unwrap();
        engine.create_branch(dir(), "b", None, false).await.unwrap();
        engine.fail_on(
            "delete_branch",
            Some("a"),
            EngineError::Internal {
                message: "boom".into(),
            },
        );

        assert!(engine.delete_branch(dir(), "a").await.is_err());
        assert!(engine.delete_branch(dir(), "b").await.is_ok());
        assert_eq!(engine.calls_to("delete_branch").len(), 2);
    }

    #[tokio::test]
    async fn checkout_unknown_revision_fails() {
        let engine = MockEngine::with_repo("main");
        let err = engine.checkout(dir(), "nope", false).await.unwrap_err();
        assert!(matches!(err, EngineError::RefNotFound { .. }));
    }

    #[tokio::test]
    async fn commit_snapshots_index() {
        let engine = MockEngine::with_repo("main");
        engine.write_file("a.txt", b"v1");
        engine.add(dir(), "a.txt").await.unwrap();
        commit(&engine, "one").await;
        engine.write_file("a.txt", b"v2");

        let content = engine.read_blob_at(dir(), "HEAD", "a.txt").await.unwrap();
        assert_eq!(content, b"v1");
    }

    #[tokio::test]
    async fn config_append_keeps_values() {
        let engine = MockEngine::with_repo("main");
        engine.set_config(dir(), "k", "1", false).await.unwrap();
        engine.set_config(dir(), "k", "2", true).await.unwrap();
        assert_eq!(engine.get_config(dir(), "k").await.unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn fake_blob_id_is_stable() {
        assert_eq!(fake_blob_id(b"abc"), fake_blob_id(b"abc"));
        assert_ne!(fake_blob_id(b"abc"), fake_blob_id(b"abd"));
    }
}
