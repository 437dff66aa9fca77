//! Property-based tests for the classifiers and core types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use gitshim::core::merge::{classify_merge, MergeReport, ALREADY_MERGED, FAST_FORWARD, SUCCESS};
use gitshim::core::status::{classify_status, FileClass, StatusRow, DETACHED_PLACEHOLDER};
use gitshim::core::types::{BranchName, Oid, RefName};

/// Strategy for generating valid branch name characters.
fn branch_name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
    ]
}

/// Strategy for generating valid branch names.
fn valid_branch_name() -> impl Strategy<Value = String> {
    prop::collection::vec(branch_name_char(), 1..50).prop_filter_map(
        "must be valid branch name",
        |chars| {
            let name: String = chars.into_iter().collect();
            if name.starts_with('-')
                || name.ends_with('/')
                || name.ends_with('.')
                || name.contains("..")
                || name.contains("//")
                || name == "@"
                || name
                    .split('/')
                    .any(|c| c.is_empty() || c.starts_with('.') || c.ends_with(".lock"))
            {
                None
            } else {
                Some(name)
            }
        },
    )
}

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Any in-range flag combination for one path.
fn status_row() -> impl Strategy<Value = StatusRow> {
    ("[a-z]{1,8}(/[a-z]{1,8})?", 0u8..=1, 0u8..=2, 0u8..=3).prop_map(|(path, h, w, s)| {
        StatusRow::from_codes(path, h, w, s).unwrap()
    })
}

/// Status matrices with unique paths, like an engine produces.
fn status_matrix() -> impl Strategy<Value = Vec<StatusRow>> {
    prop::collection::vec(status_row(), 0..24).prop_map(|rows| {
        let mut seen = std::collections::HashSet::new();
        rows.into_iter()
            .filter(|row| seen.insert(row.path.clone()))
            .collect()
    })
}

fn merge_report() -> impl Strategy<Value = MergeReport> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(already_merged, fast_forward, merge_commit, has_tree)| MergeReport {
            already_merged,
            fast_forward,
            merge_commit,
            tree: has_tree.then(|| Oid::new("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap()),
            ..Default::default()
        },
    )
}

proptest! {
    /// One file record per table match, in input order.
    #[test]
    fn status_files_follow_table_matches(rows in status_matrix()) {
        let status = classify_status(&rows, Some("main"));
        let matched: Vec<&str> = rows
            .iter()
            .filter(|row| FileClass::of(row).is_some())
            .map(|row| row.path.as_str())
            .collect();
        let files: Vec<&str> = status.files.iter().map(|f| f.path.as_str()).collect();
        prop_assert_eq!(files, matched);
    }

    /// Unmatched combinations land in no bucket.
    #[test]
    fn unmatched_rows_land_nowhere(rows in status_matrix()) {
        let status = classify_status(&rows, Some("main"));
        for row in rows.iter().filter(|row| FileClass::of(row).is_none()) {
            let path = &row.path;
            prop_assert!(!status.not_added.contains(path));
            prop_assert!(!status.created.contains(path));
            prop_assert!(!status.modified.contains(path));
            prop_assert!(!status.deleted.contains(path));
            prop_assert!(!status.staged.contains(path));
        }
        prop_assert!(status.conflicted.is_empty());
        prop_assert!(status.ignored.is_empty());
    }

    /// Staged paths are exactly the matched rows whose change is in the index.
    #[test]
    fn staged_bucket_matches_class(rows in status_matrix()) {
        let status = classify_status(&rows, Some("main"));
        let staged: Vec<&str> = rows
            .iter()
            .filter(|row| FileClass::of(row).is_some_and(FileClass::is_staged))
            .map(|row| row.path.as_str())
            .collect();
        prop_assert_eq!(status.staged.iter().map(String::as_str).collect::<Vec<_>>(), staged);
    }

    /// Each matched file's markers come from its table row.
    #[test]
    fn file_markers_match_class(rows in status_matrix()) {
        let status = classify_status(&rows, None);
        for file in &status.files {
            let row = rows.iter().find(|r| r.path == file.path).unwrap();
            let class = FileClass::of(row).unwrap();
            prop_assert_eq!((file.index, file.working_dir), class.markers());
        }
        prop_assert!(status.detached);
        prop_assert_eq!(status.current.as_str(), DETACHED_PLACEHOLDER);
    }

    /// Result text precedence: already merged, then fast-forward, then success.
    #[test]
    fn merge_result_text_precedence(report in merge_report()) {
        let expected = if report.already_merged {
            ALREADY_MERGED
        } else if report.fast_forward {
            FAST_FORWARD
        } else {
            SUCCESS
        };
        prop_assert_eq!(classify_merge(&report, &[]).result, expected);
    }

    /// A stage-3 row is a conflict, never a merged path.
    #[test]
    fn conflicted_rows_never_merged(report in merge_report(), rows in status_matrix()) {
        let summary = classify_merge(&report, &rows);
        for row in rows.iter().filter(|r| r.codes().2 == 3) {
            prop_assert!(!summary.merges.contains(&row.path));
            prop_assert_eq!(summary.conflicts.contains(&row.path), report.tree.is_some());
        }
        prop_assert_eq!(summary.changes, summary.merges.len() + summary.conflicts.len());
        prop_assert_eq!(summary.failed, !summary.conflicts.is_empty());
    }

    /// Without a tree the matrix is not consulted.
    #[test]
    fn no_tree_means_no_paths(report in merge_report(), rows in status_matrix()) {
        let report = MergeReport { tree: None, ..report };
        let summary = classify_merge(&report, &rows);
        prop_assert!(summary.merges.is_empty());
        prop_assert!(summary.conflicts.is_empty());
        prop_assert!(!summary.failed);
    }

    /// Flag codes survive the typed representation.
    #[test]
    fn status_row_codes_roundtrip(h in 0u8..=1, w in 0u8..=2, s in 0u8..=3) {
        let row = StatusRow::from_codes("f", h, w, s).unwrap();
        prop_assert_eq!(row.codes(), (h, w, s));
    }

    /// Out-of-range codes are rejected.
    #[test]
    fn status_row_rejects_bad_codes(h in 2u8..10, w in 3u8..10, s in 4u8..10) {
        prop_assert!(StatusRow::from_codes("f", h, 0, 0).is_none());
        prop_assert!(StatusRow::from_codes("f", 0, w, 0).is_none());
        prop_assert!(StatusRow::from_codes("f", 0, 0, s).is_none());
    }

    /// Valid branch names become refs under refs/heads/.
    #[test]
    fn branch_name_to_refname(name in valid_branch_name()) {
        let branch = BranchName::new(&name).unwrap();
        let refname = RefName::for_branch(&branch);
        prop_assert_eq!(refname.as_str(), format!("refs/heads/{name}"));
    }

    /// OIDs are normalized to lowercase.
    #[test]
    fn oid_normalized_to_lowercase(oid_str in valid_oid_string()) {
        let oid = Oid::new(oid_str.to_uppercase()).unwrap();
        prop_assert_eq!(oid.as_str(), oid_str.as_str());
    }

    /// Oid::short returns a prefix of the full id.
    #[test]
    fn oid_short_is_prefix(oid_str in valid_oid_string(), len in 1usize..60) {
        let oid = Oid::new(&oid_str).unwrap();
        let short = oid.short(len);
        prop_assert!(oid_str.starts_with(short));
        prop_assert_eq!(short.len(), len.min(40));
    }

    /// Any valid OID round-trips through serde.
    #[test]
    fn oid_serde_roundtrip(oid_str in valid_oid_string()) {
        let oid = Oid::new(&oid_str).unwrap();
        let json = serde_json::to_string(&oid).unwrap();
        let parsed: Oid = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(oid, parsed);
    }
}

mod edge_cases {
    use super::*;

    #[test]
    fn table_has_exactly_six_rows() {
        let mut matched = 0;
        for h in 0..=1 {
            for w in 0..=2 {
                for s in 0..=3 {
                    let row = StatusRow::from_codes("f", h, w, s).unwrap();
                    if FileClass::of(&row).is_some() {
                        matched += 1;
                    }
                }
            }
        }
        assert_eq!(matched, 6);
    }

    #[test]
    fn oid_validation_consistent() {
        assert!(Oid::new("a".repeat(40)).is_ok());
        assert!(Oid::new("a".repeat(64)).is_ok());
        assert!(Oid::new("a".repeat(39)).is_err());
        assert!(Oid::new("g".repeat(40)).is_err());
    }
}
