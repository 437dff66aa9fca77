//! Façade tests against the in-memory engine.
//!
//! The mock records every primitive call, so these tests check both what
//! the client returns and exactly which engine calls it made.

use std::path::Path;
use std::sync::Arc;

use gitshim::client::callback::with_callback;
use gitshim::client::options::{
    BranchOptions, CheckRepoAction, CloneOptions, CommitOptions, FetchOptions, InitOptions,
    LogOptions, MergeOptions, PullOptions, PushOptions,
};
use gitshim::client::{ClientError, GitClient, UnsupportedOperation};
use gitshim::core::merge::MergeReport;
use gitshim::core::status::StatusRow;
use gitshim::core::types::{Identity, Oid};
use gitshim::engine::mock::MockEngine;
use gitshim::engine::{Engine, EngineError};

fn setup() -> (MockEngine, GitClient) {
    let engine = MockEngine::with_repo("main");
    let client = GitClient::new("/repo", Arc::new(engine.clone()));
    (engine, client)
}

/// Setup with one commit on `main`.
async fn setup_with_commit() -> (MockEngine, GitClient) {
    let (engine, client) = setup();
    engine.write_file("README.md", b"# hi\n");
    client
        .commit(
            "Initial commit",
            CommitOptions {
                files: vec!["README.md".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    (engine, client)
}

fn boom() -> EngineError {
    EngineError::Internal {
        message: "boom".into(),
    }
}

fn row(path: &str, h: u8, w: u8, s: u8) -> StatusRow {
    StatusRow::from_codes(path, h, w, s).unwrap()
}

fn tree() -> Option<Oid> {
    Some(Oid::new("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap())
}

// =============================================================================
// Unsupported Operations
// =============================================================================

mod unsupported {
    use super::*;

    async fn run(client: &GitClient, op: UnsupportedOperation) -> ClientError {
        let args = vec!["--all".to_string()];
        let result = match op {
            UnsupportedOperation::ApplyPatch => client.apply_patch(&args).await,
            UnsupportedOperation::Clean => client.clean("f", &args).await,
            UnsupportedOperation::Diff => client.diff(&args).await,
            UnsupportedOperation::DiffSummary => client.diff_summary(&args).await,
            UnsupportedOperation::Raw => client.raw(&args).await,
            UnsupportedOperation::Rebase => client.rebase(&args).await,
            UnsupportedOperation::Stash => client.stash(&args).await,
            UnsupportedOperation::StashList => client.stash_list(&args).await.map(|_| String::new()),
            UnsupportedOperation::SubmoduleAdd => client.submodule_add("url", "path").await,
            UnsupportedOperation::Mirror => client.mirror("url", "path").await,
            UnsupportedOperation::CountObjects => client.count_objects().await,
            UnsupportedOperation::UpdateServerInfo => client.update_server_info().await,
            UnsupportedOperation::Mv => client.mv(&args, "dest").await,
        };
        result.unwrap_err()
    }

    #[tokio::test]
    async fn every_operation_fails_without_engine_calls() {
        let (engine, client) = setup();

        for op in UnsupportedOperation::ALL {
            let err = run(&client, op).await;
            match err {
                ClientError::Unsupported(e) => {
                    assert_eq!(e.operation, op.name());
                    assert!(e.to_string().contains("not supported"));
                }
                other => panic!("{op}: expected unsupported, got {other:?}"),
            }
        }

        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn unsupported_even_without_repository() {
        let engine = MockEngine::new();
        let client = GitClient::new("/nowhere", Arc::new(engine.clone()));

        assert!(client.stash(&[]).await.unwrap_err().is_unsupported());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn mirror_clone_option_is_refused() {
        let (engine, client) = setup();
        let err = client
            .clone(
                "https://example.com/r.git",
                "copy",
                CloneOptions {
                    mirror: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(engine.calls_to("clone").is_empty());
    }
}

// =============================================================================
// Status
// =============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn modified_and_restaged_file() {
        let (engine, client) = setup();
        engine.set_status(vec![row("lib.rs", 1, 2, 2)]);

        let status = client.status().await.unwrap();
        assert_eq!(status.modified, vec!["lib.rs"]);
        assert_eq!(status.staged, vec!["lib.rs"]);
        assert_eq!(status.files.len(), 1);
        assert_eq!((status.files[0].index, status.files[0].working_dir), ('M', ' '));
    }

    #[tokio::test]
    async fn unmatched_rows_are_dropped() {
        let (engine, client) = setup();
        engine.set_status(vec![
            row("same", 1, 1, 1),
            row("conflict", 1, 2, 3),
            row("new", 0, 2, 0),
        ]);

        let status = client.status().await.unwrap();
        assert_eq!(status.files.len(), 1);
        assert_eq!(status.not_added, vec!["new"]);
        assert!(status.conflicted.is_empty());
    }

    #[tokio::test]
    async fn detached_head_reports_placeholder() {
        let (engine, client) = setup_with_commit().await;
        let head = engine.resolve_ref(Path::new("/repo"), "HEAD").await.unwrap();
        client.checkout(head.as_str()).await.unwrap();

        let status = client.status().await.unwrap();
        assert!(status.detached);
        assert_eq!(status.current, "HEAD");
    }

    #[tokio::test]
    async fn engine_failure_passes_through() {
        let (engine, client) = setup();
        engine.fail_on("status_matrix", None, boom());

        let err = client.status().await.unwrap_err();
        assert_eq!(err, ClientError::Delegate(boom()));
    }

    #[tokio::test]
    async fn status_runs_in_handle_directory() {
        let (engine, mut client) = setup();
        client.cwd("sub");
        client.status().await.unwrap();

        let call = &engine.calls_to("status_matrix")[0];
        assert_eq!(call.dir.as_deref(), Some(Path::new("/repo/sub")));
    }
}

// =============================================================================
// Merge
// =============================================================================

mod merge {
    use super::*;

    #[tokio::test]
    async fn missing_branch_fails_before_engine_call() {
        let (engine, client) = setup();

        let err = client.merge(MergeOptions::default()).await.unwrap_err();
        match err {
            ClientError::Unsupported(e) => assert_eq!(e.reason, "branch not specified"),
            other => panic!("expected unsupported, got {other:?}"),
        }
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn already_merged_skips_status() {
        let (engine, client) = setup_with_commit().await;
        engine.set_merge_report(MergeReport {
            already_merged: true,
            ..Default::default()
        });
        engine.set_status(vec![row("x", 1, 2, 3)]);

        let summary = client.merge_from_to("main", "main").await.unwrap();
        assert_eq!(summary.result, "Already up-to-date.");
        assert!(summary.conflicts.is_empty());
        assert!(engine.calls_to("status_matrix").is_empty());
    }

    #[tokio::test]
    async fn tree_triggers_matrix_scan() {
        let (engine, client) = setup_with_commit().await;
        engine.set_merge_report(MergeReport {
            merge_commit: true,
            tree: tree(),
            ..Default::default()
        });
        engine.set_status(vec![
            row("clean.txt", 0, 2, 2),
            row("both.txt", 1, 2, 3),
            row("same.txt", 1, 1, 1),
        ]);

        let summary = client
            .merge(MergeOptions {
                from: Some("main".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.result, "success");
        assert_eq!(summary.merges, vec!["clean.txt"]);
        assert_eq!(summary.conflicts, vec!["both.txt"]);
        assert_eq!(summary.changes, 2);
        assert!(summary.failed);
        assert_eq!(engine.calls_to("status_matrix").len(), 1);
    }

    #[tokio::test]
    async fn captured_matrix_replaces_status_read() {
        let (engine, client) = setup_with_commit().await;
        engine.set_merge_report(MergeReport {
            fast_forward: true,
            tree: tree(),
            matrix: Some(vec![row("shared.txt", 1, 2, 2), row("README.md", 1, 1, 1)]),
            ..Default::default()
        });
        // the live matrix after the branch moved shows nothing
        engine.set_status(vec![row("shared.txt", 1, 1, 1)]);

        let summary = client.merge_from_to("main", "main").await.unwrap();
        assert_eq!(summary.merges, vec!["shared.txt"]);
        assert_eq!(summary.changes, 1);
        assert!(engine.calls_to("status_matrix").is_empty());
    }

    #[tokio::test]
    async fn fast_forward_result_text() {
        let (engine, client) = setup_with_commit().await;
        engine.set_merge_report(MergeReport {
            fast_forward: true,
            tree: tree(),
            ..Default::default()
        });

        let summary = client.merge_from_to("main", "main").await.unwrap();
        assert_eq!(summary.result, "Fast-forward");
    }

    #[tokio::test]
    async fn merge_passes_options_through() {
        let (engine, client) = setup_with_commit().await;
        client
            .merge(MergeOptions {
                from: Some("main".into()),
                into: Some("main".into()),
                fast_forward_only: true,
                message: Some("msg".into()),
            })
            .await
            .unwrap();

        let call = &engine.calls_to("merge")[0];
        assert_eq!(call.target.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn pull_is_classified_like_merge() {
        let (engine, client) = setup_with_commit().await;
        client.add_remote("origin", "https://example.com/r.git").await.unwrap();
        engine.set_merge_report(MergeReport {
            fast_forward: true,
            tree: tree(),
            ..Default::default()
        });
        engine.set_status(vec![row("pulled.txt", 0, 2, 2)]);

        let summary = client.pull(PullOptions::default()).await.unwrap();
        assert_eq!(summary.result, "Fast-forward");
        assert_eq!(summary.merges, vec!["pulled.txt"]);
        assert_eq!(engine.calls_to("pull")[0].target.as_deref(), Some("origin"));
    }
}

// =============================================================================
// Branches
// =============================================================================

mod branches {
    use super::*;

    #[tokio::test]
    async fn multi_delete_isolates_failures() {
        let (engine, client) = setup_with_commit().await;
        client.checkout_local_branch("a").await.unwrap();
        client.checkout_local_branch("b").await.unwrap();
        client.checkout("main").await.unwrap();
        engine.fail_on("delete_branch", Some("a"), boom());

        let result = client.delete_local_branches(&["a", "b"]).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].branch, "a");
        assert_eq!(result.errors[0].error.as_deref(), Some("boom"));

        let flags: Vec<_> = result
            .all
            .iter()
            .map(|r| (r.branch.as_str(), r.success))
            .collect();
        assert_eq!(flags, vec![("a", false), ("b", true)]);
        assert!(result.branches["b"].hash.is_some());

        // both attempted, in input order
        let targets: Vec<_> = engine
            .calls_to("delete_branch")
            .into_iter()
            .filter_map(|c| c.target)
            .collect();
        assert_eq!(targets, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn multi_delete_all_succeed() {
        let (_engine, client) = setup_with_commit().await;
        client.checkout_local_branch("x").await.unwrap();
        client.checkout("main").await.unwrap();

        let result = client.delete_local_branches(&["x"]).await.unwrap();
        assert!(result.success);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn single_delete_propagates_error() {
        let (_engine, client) = setup_with_commit().await;
        let err = client.delete_local_branch("missing").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Delegate(EngineError::RefNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn branch_summary() {
        let (_engine, client) = setup_with_commit().await;
        client.checkout_local_branch("feature").await.unwrap();

        let summary = client.branch_local().await.unwrap();
        assert_eq!(summary.all, vec!["feature", "main"]);
        assert_eq!(summary.current, "feature");
        assert!(summary.branches["feature"].current);
        assert_eq!(summary.branches["main"].label, "Initial commit");
    }

    #[tokio::test]
    async fn remote_branch_summary() {
        let (engine, client) = setup_with_commit().await;
        let head = engine.resolve_ref(Path::new("/repo"), "HEAD").await.unwrap();
        engine.add_remote_branch("origin", "main", head);

        let summary = client
            .branch(BranchOptions {
                remote: Some("origin".into()),
            })
            .await
            .unwrap();
        assert_eq!(summary.all, vec!["origin/main"]);
        assert!(!summary.branches["origin/main"].current);
    }
}

// =============================================================================
// Repository, Commits, Transport
// =============================================================================

mod operations {
    use super::*;

    #[tokio::test]
    async fn check_is_repo_swallows_engine_errors() {
        let engine = MockEngine::new();
        let client = GitClient::new("/repo", Arc::new(engine));
        assert!(!client.check_is_repo(CheckRepoAction::IsRepo).await.unwrap());
    }

    #[tokio::test]
    async fn check_is_repo_root_compares_paths() {
        let (engine, mut client) = setup();
        engine.set_root("/repo");
        assert!(client
            .check_is_repo(CheckRepoAction::IsRepoRoot)
            .await
            .unwrap());

        client.cwd("sub");
        assert!(client.check_is_repo(CheckRepoAction::IsRepo).await.unwrap());
        assert!(!client
            .check_is_repo(CheckRepoAction::IsRepoRoot)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn init_uses_default_branch() {
        let engine = MockEngine::new();
        let client = GitClient::new("/new", Arc::new(engine.clone()));

        let result = client.init(InitOptions::default()).await.unwrap();
        assert!(!result.existing);
        assert_eq!(engine.calls_to("init")[0].target.as_deref(), Some("main"));
        assert_eq!(client.status().await.unwrap().current, "main");
    }

    #[tokio::test]
    async fn init_existing_skips_engine_init() {
        let (engine, client) = setup();
        let result = client.init(InitOptions::default()).await.unwrap();
        assert!(result.existing);
        assert!(engine.calls_to("init").is_empty());
    }

    #[tokio::test]
    async fn commit_result_shape() {
        let (engine, mut client) = setup();
        client.set_identity(Identity::new("Jane", "jane@example.com"));
        engine.write_file("a", b"a");

        let root = client
            .commit(
                "first",
                CommitOptions {
                    files: vec!["a".into()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(root.root);
        assert_eq!(root.branch, "main");
        assert_eq!(root.author, Identity::new("Jane", "jane@example.com"));

        let second = client.commit("second", CommitOptions::default()).await.unwrap();
        assert!(!second.root);

        let amended = client
            .commit(
                "second, reworded",
                CommitOptions {
                    amend: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!amended.root);
        assert_eq!(client.log(LogOptions::default()).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn add_stops_at_first_failure() {
        let (engine, client) = setup();
        engine.write_file("a", b"a");
        engine.write_file("c", b"c");

        let err = client.add(&["a", "missing", "c"]).await.unwrap_err();
        assert!(matches!(err, ClientError::Delegate(EngineError::Io { .. })));
        assert_eq!(engine.calls_to("add").len(), 2);
    }

    #[tokio::test]
    async fn rm_keep_local_keeps_file() {
        let (engine, client) = setup_with_commit().await;
        client.rm_keep_local(&["README.md"]).await.unwrap();
        assert!(engine.has_file("README.md"));

        client.rm(&["README.md"]).await.unwrap();
        assert!(!engine.has_file("README.md"));
    }

    #[tokio::test]
    async fn log_and_show() {
        let (engine, client) = setup_with_commit().await;
        engine.write_file("b", b"b");
        client
            .commit(
                "second\n\nbody",
                CommitOptions {
                    files: vec!["b".into()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let log = client.log(LogOptions::default()).await.unwrap();
        assert_eq!(log.total, 2);
        assert_eq!(log.latest.as_ref().unwrap().message, "second");
        assert_eq!(log.latest.as_ref().unwrap().body, "body");

        let shown = client.show_file("HEAD", "b").await.unwrap();
        assert_eq!(shown, "b");

        let commit = client.show_commit("HEAD").await.unwrap();
        assert_eq!(commit.parents.len(), 1);
    }

    #[tokio::test]
    async fn hash_object_write_flag() {
        let (engine, client) = setup();
        let hashed = client.hash_object(b"data", false).await.unwrap();
        let written = client.hash_object(b"data", true).await.unwrap();

        assert_eq!(hashed, written);
        assert_eq!(engine.calls_to("hash_blob").len(), 1);
        assert_eq!(engine.calls_to("write_blob").len(), 1);
        assert_eq!(client.cat_file(written.as_str()).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn config_round_trip() {
        let (_engine, client) = setup();
        client.add_config("core.x", "1", false).await.unwrap();
        client.add_config("core.x", "2", true).await.unwrap();

        let got = client.get_config("core.x").await.unwrap();
        assert_eq!(got.value.as_deref(), Some("2"));
        assert_eq!(got.values, vec!["1", "2"]);
        assert_eq!(client.list_config().await.unwrap().all.len(), 1);
    }

    #[tokio::test]
    async fn push_defaults_to_current_branch() {
        let (engine, client) = setup_with_commit().await;
        client.add_remote("origin", "https://example.com/r.git").await.unwrap();

        let result = client.push(PushOptions::default()).await.unwrap();
        assert!(result.ok);
        assert_eq!(
            engine.calls_to("push")[0].target.as_deref(),
            Some("refs/heads/main")
        );
    }

    #[tokio::test]
    async fn push_detached_head_needs_branch() {
        let (engine, client) = setup_with_commit().await;
        let head = engine.resolve_ref(Path::new("/repo"), "HEAD").await.unwrap();
        client.checkout(head.as_str()).await.unwrap();

        let err = client.push(PushOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Delegate(EngineError::RefNotFound { .. })
        ));
        assert!(engine.calls_to("push").is_empty());
    }

    #[tokio::test]
    async fn push_tags_isolates_failures() {
        let (engine, client) = setup_with_commit().await;
        client.add_remote("origin", "https://example.com/r.git").await.unwrap();
        client.add_tag("v1").await.unwrap();
        client.add_tag("v2").await.unwrap();
        engine.fail_on("push", Some("refs/tags/v1"), boom());

        let result = client.push_tags(None).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.pushed, vec!["v2"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].tag, "v1");
        assert_eq!(engine.calls_to("push").len(), 2);
    }

    #[tokio::test]
    async fn fetch_uses_configured_remote() {
        let (engine, client) = setup();
        let err = client.fetch(FetchOptions::default()).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Delegate(EngineError::RemoteNotFound {
                name: "origin".into()
            })
        );
        assert_eq!(engine.calls_to("fetch")[0].target.as_deref(), Some("origin"));
    }

    #[tokio::test]
    async fn clone_resolves_relative_path() {
        let engine = MockEngine::new();
        let client = GitClient::new("/work", Arc::new(engine.clone()));

        let path = client
            .clone("https://example.com/r.git", "copy", CloneOptions::default())
            .await
            .unwrap();
        assert_eq!(path, Path::new("/work/copy"));
        assert_eq!(
            engine.calls_to("clone")[0].dir.as_deref(),
            Some(Path::new("/work/copy"))
        );
    }

    #[tokio::test]
    async fn tags_listing() {
        let (_engine, client) = setup_with_commit().await;
        client.add_annotated_tag("v1", "first").await.unwrap();
        client.add_tag("v2").await.unwrap();

        let tags = client.tags().await.unwrap();
        assert_eq!(tags.all, vec!["v1", "v2"]);
        assert_eq!(tags.latest.as_deref(), Some("v2"));
    }
}

// =============================================================================
// Callback Adapter
// =============================================================================

#[tokio::test]
async fn callback_receives_error_for_unsupported() {
    let (_engine, client) = setup();
    let mut message = None;

    let result = with_callback(client.diff(&[]), |outcome| {
        message = outcome.err().map(|e| e.to_string());
    })
    .await;

    assert!(result.is_err());
    assert_eq!(
        message.as_deref(),
        Some("diff: operation not supported by this engine")
    );
}

#[tokio::test]
async fn callback_receives_value() {
    let (engine, client) = setup();
    engine.set_status(vec![row("a", 0, 2, 0)]);
    let mut untracked = 0;

    with_callback(client.status(), |outcome| {
        untracked = outcome.map(|s| s.not_added.len()).unwrap_or(0);
    })
    .await
    .unwrap();

    assert_eq!(untracked, 1);
}
