//! git::interface
//!
//! Engine implementation using git2.
//!
//! This module is the **only** place `git2` is imported. Every
//! [`Engine`] primitive opens the repository containing the requested
//! directory, performs its work on a blocking worker thread, and converts
//! libgit2 failures into [`EngineError`] categories.
//!
//! # Status Matrix
//!
//! Rows are computed by comparing three blob ids per path: the HEAD tree
//! entry, the stage-0 index entry, and the hash of the working-tree file.
//! Paths with higher-stage index entries (unresolved conflicts) always
//! report stage 3.
//!
//! # Example
//!
//! ```ignore
//! use gitshim::engine::Engine;
//! use gitshim::git::Git;
//! use std::path::Path;
//!
//! let git = Git::new();
//! let rows = git.status_matrix(Path::new(".")).await?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::merge::MergeReport;
use crate::core::status::{HeadFlag, StageFlag, StatusRow, WorkdirFlag};
use crate::core::types::{BranchName, Identity, Oid};
use crate::engine::{
    AnnotatedTagRequest, CloneRequest, CommitInfo, CommitRequest, Credentials, Engine,
    EngineError, FetchReport, FetchRequest, InitRequest, LogRequest, MergeRequest, PullRequest,
    PushReport, PushRequest, RefUpdate, RemoteInfo,
};

/// What a failing libgit2 call was operating on.
#[derive(Debug, Clone, Copy)]
enum Subject<'a> {
    Ref(&'a str),
    Object(&'a str),
    Remote(&'a str),
    Other(&'a str),
}

impl Subject<'_> {
    fn name(&self) -> &str {
        match self {
            Subject::Ref(s) | Subject::Object(s) | Subject::Remote(s) | Subject::Other(s) => s,
        }
    }
}

/// Categorize a git2 error.
fn map_git2(err: git2::Error, subject: Subject<'_>) -> EngineError {
    use git2::{ErrorClass, ErrorCode};

    let name = subject.name().to_string();
    match (err.code(), subject) {
        (ErrorCode::NotFound | ErrorCode::UnbornBranch, Subject::Remote(_)) => {
            EngineError::RemoteNotFound { name }
        }
        (ErrorCode::NotFound | ErrorCode::UnbornBranch, Subject::Object(_)) => {
            EngineError::ObjectNotFound { oid: name }
        }
        (ErrorCode::NotFound | ErrorCode::UnbornBranch, Subject::Ref(_)) => {
            EngineError::RefNotFound { refname: name }
        }
        (ErrorCode::InvalidSpec, Subject::Object(_)) => EngineError::InvalidOid { oid: name },
        (ErrorCode::InvalidSpec, _) => EngineError::InvalidRefName {
            message: format!("{}: {}", name, err.message()),
        },
        (ErrorCode::Exists, _) => EngineError::AlreadyExists { name },
        (ErrorCode::NotFastForward, _) => EngineError::NotFastForward { refname: name },
        (ErrorCode::Conflict | ErrorCode::MergeConflict | ErrorCode::Unmerged, _) => {
            EngineError::MergeConflict { paths: Vec::new() }
        }
        (ErrorCode::Auth | ErrorCode::Certificate, _) => EngineError::Network {
            message: err.message().to_string(),
        },
        _ => match err.class() {
            ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssh | ErrorClass::Ssl => {
                EngineError::Network {
                    message: err.message().to_string(),
                }
            }
            ErrorClass::Os => EngineError::Io {
                message: err.message().to_string(),
            },
            _ if name.is_empty() => EngineError::Internal {
                message: err.message().to_string(),
            },
            _ => EngineError::Internal {
                message: format!("{}: {}", name, err.message()),
            },
        },
    }
}

impl From<git2::Error> for EngineError {
    fn from(err: git2::Error) -> Self {
        map_git2(err, Subject::Other(""))
    }
}

fn to_oid(id: git2::Oid) -> Result<Oid, EngineError> {
    Oid::new(id.to_string()).map_err(EngineError::from)
}

fn from_oid(oid: &Oid) -> Result<git2::Oid, EngineError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| map_git2(e, Subject::Object(oid.as_str())))
}

fn signature(identity: &Identity) -> Result<git2::Signature<'static>, EngineError> {
    git2::Signature::now(&identity.name, &identity.email).map_err(EngineError::from)
}

fn commit_info(commit: &git2::Commit<'_>) -> Result<CommitInfo, EngineError> {
    let author = commit.author();
    let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH);

    Ok(CommitInfo {
        oid: to_oid(commit.id())?,
        summary: commit.summary().unwrap_or("").to_string(),
        message: commit.message().unwrap_or("").to_string(),
        author_name: author.name().unwrap_or("").to_string(),
        author_email: author.email().unwrap_or("").to_string(),
        author_time,
        parents: commit
            .parent_ids()
            .map(to_oid)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn conflict_paths(index: &git2::Index) -> Result<Vec<String>, EngineError> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    Ok(paths)
}

/// Remote callbacks carrying the caller's credentials.
///
/// libgit2 re-invokes the credential callback after a rejection, so a
/// second request fails instead of looping.
fn remote_callbacks<'a>(auth: Option<Credentials>) -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    if let Some(auth) = auth {
        let mut attempts = 0;
        callbacks.credentials(move |_url, _username, _allowed| {
            attempts += 1;
            if attempts > 1 {
                return Err(git2::Error::from_str("authentication rejected"));
            }
            git2::Cred::userpass_plaintext(&auth.username, auth.password.as_deref().unwrap_or(""))
        });
    }
    callbacks
}

/// Run engine work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| EngineError::Internal {
            message: format!("engine task failed: {e}"),
        })?
}

/// Open the repository containing `dir` on the blocking pool and run `work`.
fn with_session<T, F>(dir: &Path, work: F) -> impl Future<Output = Result<T, EngineError>>
where
    F: FnOnce(&Session) -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    let dir = dir.to_path_buf();
    blocking(move || {
        let session = Session::open(&dir)?;
        work(&session)
    })
}

/// A repository opened for the duration of one primitive.
struct Session {
    repo: git2::Repository,
    dir: PathBuf,
}

impl Session {
    /// Open the repository containing `dir`.
    ///
    /// Uses `git2::Repository::discover`, so `dir` may be any directory
    /// within the working tree.
    fn open(dir: &Path) -> Result<Self, EngineError> {
        let repo = git2::Repository::discover(dir).map_err(|_| EngineError::NotARepo {
            path: dir.to_path_buf(),
        })?;
        Ok(Self {
            repo,
            dir: dir.to_path_buf(),
        })
    }

    fn root(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    fn workdir(&self) -> Result<&Path, EngineError> {
        self.repo.workdir().ok_or_else(|| EngineError::Internal {
            message: "bare repository has no working tree".into(),
        })
    }

    /// Resolve `path` (relative to the session directory) to its
    /// repository-relative and absolute forms.
    fn locate(&self, path: &str) -> Result<(PathBuf, PathBuf), EngineError> {
        let workdir = self.workdir()?.canonicalize()?;
        let absolute = self.dir.canonicalize()?.join(path);
        let relative = absolute
            .strip_prefix(&workdir)
            .map_err(|_| EngineError::Io {
                message: format!("{} is outside the repository", absolute.display()),
            })?
            .to_path_buf();
        Ok((relative, absolute))
    }

    // =========================================================================
    // Refs and Objects
    // =========================================================================

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>, EngineError> {
        match self.repo.head() {
            Ok(head) => head
                .peel_to_commit()
                .map(Some)
                .map_err(|e| map_git2(e, Subject::Ref("HEAD"))),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(map_git2(e, Subject::Ref("HEAD"))),
        }
    }

    fn head_ref_name(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.name().map(str::to_string))
    }

    fn revision(&self, rev: &str) -> Result<git2::Object<'_>, EngineError> {
        self.repo
            .revparse_single(rev)
            .map_err(|e| map_git2(e, Subject::Ref(rev)))
    }

    fn commit_at(&self, rev: &str) -> Result<git2::Commit<'_>, EngineError> {
        self.revision(rev)?
            .peel_to_commit()
            .map_err(|e| map_git2(e, Subject::Ref(rev)))
    }

    fn resolve_ref(&self, name: &str) -> Result<Oid, EngineError> {
        let object = self.revision(name)?;
        match object.peel_to_commit() {
            Ok(commit) => to_oid(commit.id()),
            Err(_) => to_oid(object.id()),
        }
    }

    fn current_branch(&self) -> Result<Option<String>, EngineError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // HEAD names a branch with no commits yet
                let unborn = self
                    .repo
                    .find_reference("HEAD")
                    .ok()
                    .and_then(|r| r.symbolic_target().map(str::to_string))
                    .and_then(|t| t.strip_prefix("refs/heads/").map(str::to_string));
                return Ok(unborn);
            }
            Err(e) => return Err(map_git2(e, Subject::Ref("HEAD"))),
        };

        if head.is_branch() {
            return Ok(head.shorthand().map(str::to_string));
        }

        Ok(None) // Detached HEAD
    }

    fn list_branches(&self, remote: Option<&str>) -> Result<Vec<String>, EngineError> {
        let (kind, prefix) = match remote {
            None => (git2::BranchType::Local, String::new()),
            Some(remote) => (git2::BranchType::Remote, format!("{remote}/")),
        };

        let mut names = Vec::new();
        for branch in self.repo.branches(Some(kind))? {
            let (branch, _) = branch?;
            let Some(name) = branch.name()? else {
                continue;
            };
            if let Some(short) = name.strip_prefix(prefix.as_str()) {
                if short != "HEAD" {
                    names.push(short.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_tags(&self) -> Result<Vec<String>, EngineError> {
        let mut tags: Vec<String> = self
            .repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(str::to_string)
            .collect();
        tags.sort();
        Ok(tags)
    }

    fn list_remotes(&self) -> Result<Vec<RemoteInfo>, EngineError> {
        let mut remotes = Vec::new();
        for name in self.repo.remotes()?.iter().flatten() {
            let remote = self
                .repo
                .find_remote(name)
                .map_err(|e| map_git2(e, Subject::Remote(name)))?;
            remotes.push(RemoteInfo {
                name: name.to_string(),
                url: remote.url().unwrap_or("").to_string(),
            });
        }
        Ok(remotes)
    }

    fn log(&self, request: &LogRequest) -> Result<Vec<CommitInfo>, EngineError> {
        let start = self.commit_at(&request.reference)?;
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        walk.push(start.id())?;

        let mut commits = Vec::new();
        for id in walk.take(request.depth.unwrap_or(usize::MAX)) {
            let commit = self.repo.find_commit(id?)?;
            commits.push(commit_info(&commit)?);
        }
        Ok(commits)
    }

    fn read_commit(&self, oid: &Oid) -> Result<CommitInfo, EngineError> {
        let commit = self
            .repo
            .find_commit(from_oid(oid)?)
            .map_err(|e| map_git2(e, Subject::Object(oid.as_str())))?;
        commit_info(&commit)
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, EngineError> {
        let blob = self
            .repo
            .find_blob(from_oid(oid)?)
            .map_err(|e| map_git2(e, Subject::Object(oid.as_str())))?;
        Ok(blob.content().to_vec())
    }

    fn read_blob_at(&self, rev: &str, path: &str) -> Result<Vec<u8>, EngineError> {
        let subject = format!("{rev}:{path}");
        let entry = self
            .commit_at(rev)?
            .tree()?
            .get_path(Path::new(path))
            .map_err(|e| map_git2(e, Subject::Object(&subject)))?;
        let blob = entry
            .to_object(&self.repo)?
            .peel_to_blob()
            .map_err(|e| map_git2(e, Subject::Object(&subject)))?;
        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Index and Commits
    // =========================================================================

    fn add(&self, path: &str) -> Result<(), EngineError> {
        let (relative, absolute) = self.locate(path)?;
        let mut index = self.repo.index()?;

        if absolute.is_dir() {
            let pathspec = if relative.as_os_str().is_empty() {
                "*".to_string()
            } else {
                format!("{}/*", relative.display())
            };
            index.add_all([pathspec.as_str()], git2::IndexAddOption::DEFAULT, None)?;
            index.update_all([pathspec.as_str()], None)?;
        } else if absolute.exists() {
            index.add_path(&relative)?;
        } else {
            index.remove_path(&relative)?;
        }

        index.write()?;
        Ok(())
    }

    fn remove(&self, path: &str, keep_local: bool) -> Result<(), EngineError> {
        let (relative, absolute) = self.locate(path)?;
        let mut index = self.repo.index()?;
        index.remove_path(&relative)?;
        index.write()?;

        if !keep_local && absolute.is_file() {
            std::fs::remove_file(&absolute)?;
        }
        Ok(())
    }

    fn commit(&self, request: &CommitRequest) -> Result<Oid, EngineError> {
        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            return Err(EngineError::MergeConflict {
                paths: conflict_paths(&index)?,
            });
        }

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = signature(&request.author)?;
        let head = self.head_commit()?;

        let id = if request.amend {
            let head = head.ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })?;
            head.amend(
                Some("HEAD"),
                Some(&signature),
                Some(&signature),
                None,
                Some(&request.message),
                Some(&tree),
            )?
        } else {
            let mut parents: Vec<git2::Commit<'_>> = head.into_iter().collect();
            // Concluding a conflicted merge records the merged-in commit too.
            if let Ok(merge_head) = self.repo.find_reference("MERGE_HEAD") {
                parents.push(merge_head.peel_to_commit()?);
            }
            let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
            let id = self.repo.commit(
                Some("HEAD"),
                &signature,
                &signature,
                &request.message,
                &tree,
                &parent_refs,
            )?;
            self.repo.cleanup_state()?;
            id
        };

        to_oid(id)
    }

    // =========================================================================
    // Branches and Checkout
    // =========================================================================

    fn create_branch(
        &self,
        name: &str,
        start: Option<&str>,
        checkout: bool,
    ) -> Result<(), EngineError> {
        BranchName::new(name)?;
        let commit = match start {
            Some(rev) => self.commit_at(rev)?,
            None => self.head_commit()?.ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })?,
        };
        self.repo
            .branch(name, &commit, false)
            .map_err(|e| map_git2(e, Subject::Ref(name)))?;

        if checkout {
            self.checkout(name, false)?;
        }
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<(), EngineError> {
        let refname = format!("refs/heads/{name}");
        let mut branch = self
            .repo
            .find_branch(name, git2::BranchType::Local)
            .map_err(|e| map_git2(e, Subject::Ref(&refname)))?;
        branch
            .delete()
            .map_err(|e| map_git2(e, Subject::Ref(&refname)))
    }

    fn checkout(&self, target: &str, force: bool) -> Result<(), EngineError> {
        let mut builder = git2::build::CheckoutBuilder::new();
        if force {
            builder.force();
        } else {
            builder.safe();
        }

        if let Ok(branch) = self.repo.find_branch(target, git2::BranchType::Local) {
            let commit = branch.get().peel_to_commit()?;
            self.repo.checkout_tree(commit.as_object(), Some(&mut builder))?;
            self.repo.set_head(&format!("refs/heads/{target}"))?;
            return Ok(());
        }

        // A remote-tracking branch of the same name becomes a local branch.
        for remote in self.repo.remotes()?.iter().flatten() {
            let tracking = format!("{remote}/{target}");
            if let Ok(branch) = self.repo.find_branch(&tracking, git2::BranchType::Remote) {
                let commit = branch.get().peel_to_commit()?;
                let mut local = self.repo.branch(target, &commit, false)?;
                local.set_upstream(Some(tracking.as_str()))?;
                self.repo.checkout_tree(commit.as_object(), Some(&mut builder))?;
                self.repo.set_head(&format!("refs/heads/{target}"))?;
                return Ok(());
            }
        }

        let commit = self.commit_at(target)?;
        self.repo.checkout_tree(commit.as_object(), Some(&mut builder))?;
        self.repo.set_head_detached(commit.id())?;
        Ok(())
    }

    // =========================================================================
    // Status
    // =========================================================================

    fn status_matrix(&self) -> Result<Vec<StatusRow>, EngineError> {
        let workdir = self.workdir()?.to_path_buf();

        let mut head: BTreeMap<String, git2::Oid> = BTreeMap::new();
        if let Some(commit) = self.head_commit()? {
            commit
                .tree()?
                .walk(git2::TreeWalkMode::PreOrder, |root, entry| {
                    if entry.kind() == Some(git2::ObjectType::Blob) {
                        if let Some(name) = entry.name() {
                            head.insert(format!("{root}{name}"), entry.id());
                        }
                    }
                    git2::TreeWalkResult::Ok
                })?;
        }

        let mut staged: BTreeMap<String, git2::Oid> = BTreeMap::new();
        let mut conflicted: BTreeSet<String> = BTreeSet::new();
        for entry in self.repo.index()?.iter() {
            let path = String::from_utf8_lossy(&entry.path).into_owned();
            // stage number lives in bits 12-13 of the entry flags
            if (entry.flags >> 12) & 0x3 == 0 {
                staged.insert(path, entry.id);
            } else {
                conflicted.insert(path);
            }
        }

        let mut options = git2::StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let untracked: Vec<String> = self
            .repo
            .statuses(Some(&mut options))?
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();

        let mut paths: BTreeSet<String> = head.keys().cloned().collect();
        paths.extend(staged.keys().cloned());
        paths.extend(conflicted.iter().cloned());
        paths.extend(untracked);

        let mut rows = Vec::with_capacity(paths.len());
        for path in paths {
            let head_id = head.get(&path).copied();
            let stage_id = staged.get(&path).copied();
            let file = workdir.join(&path);
            let work_id = if file.is_file() {
                Some(git2::Oid::hash_file(git2::ObjectType::Blob, &file)?)
            } else {
                None
            };

            let head_flag = match head_id {
                Some(_) => HeadFlag::Present,
                None => HeadFlag::Absent,
            };
            let workdir_flag = match work_id {
                None => WorkdirFlag::Absent,
                Some(id) if Some(id) == head_id => WorkdirFlag::Unchanged,
                Some(_) => WorkdirFlag::Modified,
            };
            let stage_flag = match stage_id {
                _ if conflicted.contains(&path) => StageFlag::Conflict,
                None => StageFlag::Absent,
                Some(id) if Some(id) == head_id => StageFlag::Unchanged,
                Some(id) if Some(id) == work_id => StageFlag::Modified,
                Some(_) => StageFlag::Conflict,
            };

            rows.push(StatusRow::new(path, head_flag, workdir_flag, stage_flag));
        }

        Ok(rows)
    }

    // =========================================================================
    // Merge
    // =========================================================================

    fn merge(&self, request: &MergeRequest, author: &Identity) -> Result<MergeReport, EngineError> {
        let head_ref = self.head_ref_name();
        let ours_ref = match &request.ours {
            Some(branch) => format!("refs/heads/{branch}"),
            None => head_ref.clone().ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })?,
        };
        let is_head = head_ref.as_deref() == Some(ours_ref.as_str());

        let ours = self
            .repo
            .find_reference(&ours_ref)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| map_git2(e, Subject::Ref(&ours_ref)))?;
        let theirs = self.commit_at(&request.theirs)?;

        if ours.id() == theirs.id() || self.repo.graph_descendant_of(ours.id(), theirs.id())? {
            return Ok(MergeReport {
                oid: Some(to_oid(ours.id())?),
                already_merged: true,
                ..Default::default()
            });
        }

        if self.repo.graph_descendant_of(theirs.id(), ours.id())? {
            if is_head {
                let mut checkout = git2::build::CheckoutBuilder::new();
                checkout.safe();
                self.repo
                    .checkout_tree(theirs.as_object(), Some(&mut checkout))?;
            }
            let matrix = self.merge_matrix(is_head, &ours.tree()?, &theirs.tree()?)?;
            self.repo
                .find_reference(&ours_ref)?
                .set_target(theirs.id(), &format!("merge {}: Fast-forward", request.theirs))?;
            return Ok(MergeReport {
                oid: Some(to_oid(theirs.id())?),
                fast_forward: true,
                tree: Some(to_oid(theirs.tree_id())?),
                matrix: Some(matrix),
                ..Default::default()
            });
        }

        if request.fast_forward_only {
            return Err(EngineError::NotFastForward { refname: ours_ref });
        }

        let mut index = self.repo.merge_commits(&ours, &theirs, None)?;
        if index.has_conflicts() {
            let paths = conflict_paths(&index)?;
            if is_head {
                // Leave conflict markers and MERGE_HEAD behind for resolution.
                let annotated = self.repo.find_annotated_commit(theirs.id())?;
                let mut checkout = git2::build::CheckoutBuilder::new();
                checkout.allow_conflicts(true).conflict_style_merge(true);
                self.repo.merge(&[&annotated], None, Some(&mut checkout))?;
            }
            return Err(EngineError::MergeConflict { paths });
        }

        let tree_id = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        if is_head {
            let mut checkout = git2::build::CheckoutBuilder::new();
            checkout.safe();
            self.repo.checkout_tree(tree.as_object(), Some(&mut checkout))?;
        }
        let matrix = self.merge_matrix(is_head, &ours.tree()?, &tree)?;

        let signature = signature(author)?;
        let message = request
            .message
            .clone()
            .unwrap_or_else(|| format!("Merge branch '{}'", request.theirs));
        let id = self.repo.commit(
            Some(&ours_ref),
            &signature,
            &signature,
            &message,
            &tree,
            &[&ours, &theirs],
        )?;

        Ok(MergeReport {
            oid: Some(to_oid(id)?),
            merge_commit: true,
            tree: Some(to_oid(tree_id)?),
            matrix: Some(matrix),
            ..Default::default()
        })
    }

    /// Status rows for a merge that has updated its target but not yet
    /// moved it.
    ///
    /// Into HEAD this is the live matrix, taken while HEAD still names the
    /// pre-merge tip. Into another branch the working tree is untouched, so
    /// rows come from the diff between the old and new trees.
    fn merge_matrix(
        &self,
        is_head: bool,
        old: &git2::Tree<'_>,
        new: &git2::Tree<'_>,
    ) -> Result<Vec<StatusRow>, EngineError> {
        if is_head {
            return self.status_matrix();
        }

        let diff = self.repo.diff_tree_to_tree(Some(old), Some(new), None)?;
        let mut rows = Vec::new();
        for delta in diff.deltas() {
            let file = match delta.status() {
                git2::Delta::Deleted => delta.old_file(),
                _ => delta.new_file(),
            };
            let Some(path) = file.path() else { continue };
            let path = path.to_string_lossy().replace('\\', "/");
            let row = match delta.status() {
                git2::Delta::Added => {
                    StatusRow::new(path, HeadFlag::Absent, WorkdirFlag::Modified, StageFlag::Modified)
                }
                git2::Delta::Deleted => {
                    StatusRow::new(path, HeadFlag::Present, WorkdirFlag::Absent, StageFlag::Absent)
                }
                _ => StatusRow::new(path, HeadFlag::Present, WorkdirFlag::Modified, StageFlag::Modified),
            };
            rows.push(row);
        }
        Ok(rows)
    }

    // =========================================================================
    // Remotes and Transport
    // =========================================================================

    fn fetch(
        &self,
        request: &FetchRequest,
        auth: Option<Credentials>,
    ) -> Result<FetchReport, EngineError> {
        let mut remote = self
            .repo
            .find_remote(&request.remote)
            .map_err(|e| map_git2(e, Subject::Remote(&request.remote)))?;

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(remote_callbacks(auth));
        if request.prune {
            options.prune(git2::FetchPrune::On);
        }
        if request.tags {
            options.download_tags(git2::AutotagOption::All);
        }

        let refspecs: Vec<String> = match &request.branch {
            Some(branch) => vec![format!(
                "+refs/heads/{branch}:refs/remotes/{}/{branch}",
                request.remote
            )],
            None => Vec::new(),
        };
        remote
            .fetch(refspecs.as_slice(), Some(&mut options), None)
            .map_err(|e| map_git2(e, Subject::Remote(&request.remote)))?;

        let fetch_head = match &request.branch {
            Some(branch) => Some(
                self.resolve_ref(&format!("refs/remotes/{}/{branch}", request.remote))?,
            ),
            None => None,
        };
        Ok(FetchReport { fetch_head })
    }

    fn pull(
        &self,
        request: &PullRequest,
        author: &Identity,
        auth: Option<Credentials>,
    ) -> Result<MergeReport, EngineError> {
        let branch = match &request.branch {
            Some(branch) => branch.clone(),
            None => self.current_branch()?.ok_or_else(|| EngineError::RefNotFound {
                refname: "HEAD".into(),
            })?,
        };

        self.fetch(
            &FetchRequest {
                remote: request.remote.clone(),
                branch: Some(branch.clone()),
                tags: false,
                prune: false,
            },
            auth,
        )?;

        self.merge(
            &MergeRequest {
                ours: None,
                theirs: format!("refs/remotes/{}/{branch}", request.remote),
                fast_forward_only: request.fast_forward_only,
                message: Some(format!("Merge branch '{branch}' of {}", request.remote)),
            },
            author,
        )
    }

    fn push(
        &self,
        request: &PushRequest,
        auth: Option<Credentials>,
    ) -> Result<PushReport, EngineError> {
        let mut remote = self
            .repo
            .find_remote(&request.remote)
            .map_err(|e| map_git2(e, Subject::Remote(&request.remote)))?;

        let reference = &request.reference;
        let refspec = if request.delete {
            format!(":{reference}")
        } else if request.force {
            format!("+{reference}:{reference}")
        } else {
            format!("{reference}:{reference}")
        };

        let mut refs = Vec::new();
        {
            let mut callbacks = remote_callbacks(auth);
            callbacks.push_update_reference(|name, status| {
                refs.push(RefUpdate {
                    name: name.to_string(),
                    ok: status.is_none(),
                    error: status.map(str::to_string),
                });
                Ok(())
            });
            let mut options = git2::PushOptions::new();
            options.remote_callbacks(callbacks);
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| map_git2(e, Subject::Ref(reference)))?;
        }

        if refs.is_empty() {
            refs.push(RefUpdate {
                name: reference.clone(),
                ok: true,
                error: None,
            });
        }
        Ok(PushReport {
            ok: refs.iter().all(|r| r.ok),
            refs,
        })
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<(), EngineError> {
        self.repo
            .remote(name, url)
            .map(|_| ())
            .map_err(|e| map_git2(e, Subject::Remote(name)))
    }

    fn delete_remote(&self, name: &str) -> Result<(), EngineError> {
        self.repo
            .remote_delete(name)
            .map_err(|e| map_git2(e, Subject::Remote(name)))
    }

    // =========================================================================
    // Config
    // =========================================================================

    fn get_config(&self, key: &str) -> Result<Vec<String>, EngineError> {
        let config = self.repo.config()?;
        let mut values = Vec::new();
        let mut entries = match config.multivar(key, None) {
            Ok(entries) => entries,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(values),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next() {
            let entry = entry?;
            if let Some(value) = entry.value() {
                values.push(value.to_string());
            }
        }
        Ok(values)
    }

    fn set_config(&self, key: &str, value: &str, append: bool) -> Result<(), EngineError> {
        let mut config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        if append {
            // "^$" matches no existing value, so a new one is added
            config.set_multivar(key, "^$", value)?;
        } else {
            config.set_str(key, value)?;
        }
        Ok(())
    }

    fn list_config(&self) -> Result<Vec<(String, String)>, EngineError> {
        let config = self.repo.config()?;
        let mut entries = config.entries(None)?;
        let mut pairs = Vec::new();
        while let Some(entry) = entries.next() {
            let entry = entry?;
            if let (Some(name), Some(value)) = (entry.name(), entry.value()) {
                pairs.push((name.to_string(), value.to_string()));
            }
        }
        Ok(pairs)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    fn create_tag(&self, name: &str, target: Option<&str>) -> Result<(), EngineError> {
        let object = self.revision(target.unwrap_or("HEAD"))?;
        self.repo
            .tag_lightweight(name, &object, false)
            .map(|_| ())
            .map_err(|e| map_git2(e, Subject::Ref(name)))
    }

    fn create_annotated_tag(
        &self,
        request: &AnnotatedTagRequest,
        tagger: &Identity,
    ) -> Result<(), EngineError> {
        let object = self.revision(request.target.as_deref().unwrap_or("HEAD"))?;
        let signature = signature(tagger)?;
        self.repo
            .tag(&request.name, &object, &signature, &request.message, false)
            .map(|_| ())
            .map_err(|e| map_git2(e, Subject::Ref(&request.name)))
    }
}

fn clone_repo(request: &CloneRequest, auth: Option<Credentials>) -> Result<(), EngineError> {
    let mut fetch = git2::FetchOptions::new();
    fetch.remote_callbacks(remote_callbacks(auth));
    if let Some(depth) = request.depth {
        fetch.depth(i32::try_from(depth).unwrap_or(i32::MAX));
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch);

    if let Some(branch) = &request.branch {
        builder.branch(branch);
        if request.single_branch {
            let branch = branch.clone();
            builder.remote_create(move |repo, name, url| {
                let refspec = format!("+refs/heads/{branch}:refs/remotes/{name}/{branch}");
                repo.remote_with_fetch(name, url, &refspec)
            });
        }
    }

    if request.no_checkout {
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.dry_run();
        builder.with_checkout(checkout);
    }

    builder
        .clone(&request.url, &request.dir)
        .map_err(|e| map_git2(e, Subject::Other(&request.url)))?;
    Ok(())
}

fn init(dir: &Path, request: &InitRequest) -> Result<(), EngineError> {
    let mut options = git2::RepositoryInitOptions::new();
    options
        .bare(request.bare)
        .mkpath(true)
        .initial_head(&request.default_branch);
    git2::Repository::init_opts(dir, &options)?;
    Ok(())
}

/// The libgit2-backed engine.
///
/// Stateless: every primitive opens the repository containing the
/// directory it is given.
///
/// # Example
///
/// ```ignore
/// use gitshim::client::GitClient;
/// use gitshim::git::Git;
/// use std::sync::Arc;
///
/// let client = GitClient::new("/path/to/repo", Arc::new(Git::new()));
/// let status = client.status().await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Git;

impl Git {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Engine for Git {
    async fn find_root(&self, dir: &Path) -> Result<PathBuf, EngineError> {
        with_session(dir, |s| Ok(s.root())).await
    }

    async fn init(&self, dir: &Path, request: InitRequest) -> Result<(), EngineError> {
        let dir = dir.to_path_buf();
        blocking(move || init(&dir, &request)).await
    }

    async fn clone_repo(
        &self,
        request: CloneRequest,
        auth: Option<Credentials>,
    ) -> Result<(), EngineError> {
        blocking(move || clone_repo(&request, auth)).await
    }

    async fn fetch(
        &self,
        dir: &Path,
        request: FetchRequest,
        auth: Option<Credentials>,
    ) -> Result<FetchReport, EngineError> {
        with_session(dir, move |s| s.fetch(&request, auth)).await
    }

    async fn pull(
        &self,
        dir: &Path,
        request: PullRequest,
        author: Identity,
        auth: Option<Credentials>,
    ) -> Result<MergeReport, EngineError> {
        with_session(dir, move |s| s.pull(&request, &author, auth)).await
    }

    async fn push(
        &self,
        dir: &Path,
        request: PushRequest,
        auth: Option<Credentials>,
    ) -> Result<PushReport, EngineError> {
        with_session(dir, move |s| s.push(&request, auth)).await
    }

    async fn add(&self, dir: &Path, path: &str) -> Result<(), EngineError> {
        let path = path.to_string();
        with_session(dir, move |s| s.add(&path)).await
    }

    async fn remove(&self, dir: &Path, path: &str, keep_local: bool) -> Result<(), EngineError> {
        let path = path.to_string();
        with_session(dir, move |s| s.remove(&path, keep_local)).await
    }

    async fn commit(&self, dir: &Path, request: CommitRequest) -> Result<Oid, EngineError> {
        with_session(dir, move |s| s.commit(&request)).await
    }

    async fn resolve_ref(&self, dir: &Path, name: &str) -> Result<Oid, EngineError> {
        let name = name.to_string();
        with_session(dir, move |s| s.resolve_ref(&name)).await
    }

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>, EngineError> {
        with_session(dir, |s| s.current_branch()).await
    }

    async fn list_branches(
        &self,
        dir: &Path,
        remote: Option<&str>,
    ) -> Result<Vec<String>, EngineError> {
        let remote = remote.map(str::to_string);
        with_session(dir, move |s| s.list_branches(remote.as_deref())).await
    }

    async fn list_tags(&self, dir: &Path) -> Result<Vec<String>, EngineError> {
        with_session(dir, |s| s.list_tags()).await
    }

    async fn list_remotes(&self, dir: &Path) -> Result<Vec<RemoteInfo>, EngineError> {
        with_session(dir, |s| s.list_remotes()).await
    }

    async fn create_branch(
        &self,
        dir: &Path,
        name: &str,
        start: Option<&str>,
        checkout: bool,
    ) -> Result<(), EngineError> {
        let name = name.to_string();
        let start = start.map(str::to_string);
        with_session(dir, move |s| s.create_branch(&name, start.as_deref(), checkout)).await
    }

    async fn delete_branch(&self, dir: &Path, name: &str) -> Result<(), EngineError> {
        let name = name.to_string();
        with_session(dir, move |s| s.delete_branch(&name)).await
    }

    async fn checkout(&self, dir: &Path, target: &str, force: bool) -> Result<(), EngineError> {
        let target = target.to_string();
        with_session(dir, move |s| s.checkout(&target, force)).await
    }

    async fn status_matrix(&self, dir: &Path) -> Result<Vec<StatusRow>, EngineError> {
        with_session(dir, |s| s.status_matrix()).await
    }

    async fn merge(
        &self,
        dir: &Path,
        request: MergeRequest,
        author: Identity,
    ) -> Result<MergeReport, EngineError> {
        with_session(dir, move |s| s.merge(&request, &author)).await
    }

    async fn log(&self, dir: &Path, request: LogRequest) -> Result<Vec<CommitInfo>, EngineError> {
        with_session(dir, move |s| s.log(&request)).await
    }

    async fn read_commit(&self, dir: &Path, oid: &Oid) -> Result<CommitInfo, EngineError> {
        let oid = oid.clone();
        with_session(dir, move |s| s.read_commit(&oid)).await
    }

    async fn read_blob(&self, dir: &Path, oid: &Oid) -> Result<Vec<u8>, EngineError> {
        let oid = oid.clone();
        with_session(dir, move |s| s.read_blob(&oid)).await
    }

    async fn read_blob_at(
        &self,
        dir: &Path,
        rev: &str,
        path: &str,
    ) -> Result<Vec<u8>, EngineError> {
        let rev = rev.to_string();
        let path = path.to_string();
        with_session(dir, move |s| s.read_blob_at(&rev, &path)).await
    }

    async fn write_blob(&self, dir: &Path, content: &[u8]) -> Result<Oid, EngineError> {
        let content = content.to_vec();
        with_session(dir, move |s| to_oid(s.repo.blob(&content)?)).await
    }

    async fn hash_blob(&self, content: &[u8]) -> Result<Oid, EngineError> {
        to_oid(git2::Oid::hash_object(git2::ObjectType::Blob, content)?)
    }

    async fn get_config(&self, dir: &Path, key: &str) -> Result<Vec<String>, EngineError> {
        let key = key.to_string();
        with_session(dir, move |s| s.get_config(&key)).await
    }

    async fn set_config(
        &self,
        dir: &Path,
        key: &str,
        value: &str,
        append: bool,
    ) -> Result<(), EngineError> {
        let key = key.to_string();
        let value = value.to_string();
        with_session(dir, move |s| s.set_config(&key, &value, append)).await
    }

    async fn list_config(&self, dir: &Path) -> Result<Vec<(String, String)>, EngineError> {
        with_session(dir, |s| s.list_config()).await
    }

    async fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), EngineError> {
        let name = name.to_string();
        let url = url.to_string();
        with_session(dir, move |s| s.add_remote(&name, &url)).await
    }

    async fn delete_remote(&self, dir: &Path, name: &str) -> Result<(), EngineError> {
        let name = name.to_string();
        with_session(dir, move |s| s.delete_remote(&name)).await
    }

    async fn create_tag(
        &self,
        dir: &Path,
        name: &str,
        target: Option<&str>,
    ) -> Result<(), EngineError> {
        let name = name.to_string();
        let target = target.map(str::to_string);
        with_session(dir, move |s| s.create_tag(&name, target.as_deref())).await
    }

    async fn create_annotated_tag(
        &self,
        dir: &Path,
        request: AnnotatedTagRequest,
        tagger: Identity,
    ) -> Result<(), EngineError> {
        with_session(dir, move |s| s.create_annotated_tag(&request, &tagger)).await
    }
}
