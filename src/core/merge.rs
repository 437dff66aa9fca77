//! core::merge
//!
//! Interpretation of an engine merge report as a merge summary.
//!
//! # Rules
//!
//! The result text is picked by the first flag that holds:
//! `already_merged` gives `"Already up-to-date."`, `fast_forward` gives
//! `"Fast-forward"`, anything else gives `"success"`.
//!
//! When the merge produced a tree, the status matrix taken after the merge
//! is scanned: stage 3 rows are conflicts, rows whose head and workdir
//! flags differ (with the path still present in the working directory) are
//! merged files. No tree means nothing changed and both lists stay empty.
//!
//! Engines that update the working tree themselves capture that matrix
//! before moving the branch, while HEAD still names the pre-merge tip, and
//! hand it back in [`MergeReport::matrix`].

use serde::Serialize;

use super::status::{StageFlag, StatusRow, WorkdirFlag};
use super::types::Oid;

pub const ALREADY_MERGED: &str = "Already up-to-date.";
pub const FAST_FORWARD: &str = "Fast-forward";
pub const SUCCESS: &str = "success";

/// What the engine reports after a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Resulting commit, if the merge moved the branch.
    pub oid: Option<Oid>,
    pub already_merged: bool,
    pub fast_forward: bool,
    /// Whether a merge commit was created.
    pub merge_commit: bool,
    /// Tree written by the merge. `None` when nothing changed.
    pub tree: Option<Oid>,
    /// Status matrix taken after the working tree was updated and before
    /// the branch moved. `None` leaves the scan to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<StatusRow>>,
}

impl MergeReport {
    /// The textual result code for this report.
    ///
    /// ```
    /// use gitshim::core::merge::MergeReport;
    ///
    /// let report = MergeReport { already_merged: true, fast_forward: true, ..Default::default() };
    /// assert_eq!(report.result_text(), "Already up-to-date.");
    /// ```
    pub fn result_text(&self) -> &'static str {
        if self.already_merged {
            ALREADY_MERGED
        } else if self.fast_forward {
            FAST_FORWARD
        } else {
            SUCCESS
        }
    }
}

/// Merge summary returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub result: String,
    pub merges: Vec<String>,
    pub conflicts: Vec<String>,
    /// `merges.len() + conflicts.len()`.
    pub changes: usize,
    /// Derived: `!conflicts.is_empty()`. Kept alongside the classified
    /// fields for callers that only check a flag.
    pub failed: bool,
}

/// Build a merge summary from an engine report and the post-merge matrix.
///
/// `rows` is ignored when the report carries no tree.
pub fn classify_merge(report: &MergeReport, rows: &[StatusRow]) -> MergeSummary {
    let mut merges = Vec::new();
    let mut conflicts = Vec::new();

    if report.tree.is_some() {
        for row in rows {
            if row.stage == StageFlag::Conflict {
                conflicts.push(row.path.clone());
            } else if row.head.code() != row.workdir.code() && row.workdir != WorkdirFlag::Absent {
                merges.push(row.path.clone());
            }
        }
    }

    MergeSummary {
        result: report.result_text().to_string(),
        changes: merges.len() + conflicts.len(),
        failed: !conflicts.is_empty(),
        merges,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Option<Oid> {
        Some(Oid::new("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap())
    }

    fn row(path: &str, h: u8, w: u8, s: u8) -> StatusRow {
        StatusRow::from_codes(path, h, w, s).unwrap()
    }

    mod result_text {
        use super::*;

        #[test]
        fn already_merged_wins_over_everything() {
            let report = MergeReport {
                already_merged: true,
                fast_forward: true,
                tree: tree(),
                ..Default::default()
            };
            assert_eq!(report.result_text(), ALREADY_MERGED);
        }

        #[test]
        fn fast_forward() {
            let report = MergeReport {
                fast_forward: true,
                tree: tree(),
                ..Default::default()
            };
            assert_eq!(report.result_text(), FAST_FORWARD);
        }

        #[test]
        fn default_is_success() {
            assert_eq!(MergeReport::default().result_text(), SUCCESS);
        }
    }

    #[test]
    fn conflict_takes_precedence_over_merge() {
        let report = MergeReport {
            tree: tree(),
            ..Default::default()
        };
        let summary = classify_merge(&report, &[row("both.txt", 1, 2, 3)]);
        assert_eq!(summary.conflicts, vec!["both.txt"]);
        assert!(summary.merges.is_empty());
        assert!(summary.failed);
    }

    #[test]
    fn changed_rows_are_merged() {
        let report = MergeReport {
            tree: tree(),
            ..Default::default()
        };
        let rows = vec![
            row("new.txt", 0, 2, 2),
            row("changed.txt", 1, 2, 2),
            row("same.txt", 1, 1, 1),
            row("gone.txt", 1, 0, 0),
        ];
        let summary = classify_merge(&report, &rows);
        assert_eq!(summary.merges, vec!["new.txt", "changed.txt"]);
        assert_eq!(summary.changes, 2);
        assert!(!summary.failed);
    }

    #[test]
    fn head_and_workdir_both_one_is_not_a_merge() {
        let report = MergeReport {
            tree: tree(),
            ..Default::default()
        };
        let summary = classify_merge(&report, &[row("a", 1, 1, 2)]);
        assert!(summary.merges.is_empty());
    }

    #[test]
    fn no_tree_means_empty_lists() {
        let report = MergeReport {
            already_merged: true,
            ..Default::default()
        };
        let summary = classify_merge(&report, &[row("x", 1, 2, 3)]);
        assert!(summary.merges.is_empty());
        assert!(summary.conflicts.is_empty());
        assert_eq!(summary.changes, 0);
        assert_eq!(summary.result, ALREADY_MERGED);
    }

    #[test]
    fn change_count_sums_both_lists() {
        let report = MergeReport {
            tree: tree(),
            ..Default::default()
        };
        let rows = vec![row("a", 0, 2, 2), row("b", 1, 2, 3), row("c", 1, 2, 3)];
        let summary = classify_merge(&report, &rows);
        assert_eq!(summary.changes, 3);
    }
}
