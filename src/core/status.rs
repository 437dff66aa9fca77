//! core::status
//!
//! Classification of the engine's status matrix into the familiar
//! status summary (`not_added`, `created`, `modified`, ...).
//!
//! # Status Matrix
//!
//! The engine reports one [`StatusRow`] per path with three flags:
//!
//! | column  | 0      | 1                 | 2                    | 3        |
//! |---------|--------|-------------------|----------------------|----------|
//! | head    | absent | present           |                      |          |
//! | workdir | absent | same as HEAD      | differs from HEAD    |          |
//! | stage   | absent | same as HEAD      | same as workdir      | conflict |
//!
//! # Classification Table
//!
//! | head | workdir | stage | buckets             | index | tree |
//! |------|---------|-------|---------------------|-------|------|
//! | 0    | 2       | 0     | not_added           | `?`   | `?`  |
//! | 0    | 2       | 2     | created, staged     | `A`   | ` `  |
//! | 1    | 2       | 2     | modified, staged    | `M`   | ` `  |
//! | 1    | 2       | 1     | modified            | ` `   | `M`  |
//! | 1    | 0       | 0     | deleted, staged     | `D`   | ` `  |
//! | 1    | 0       | 1     | deleted             | ` `   | `D`  |
//!
//! Every other combination is dropped: it lands in no bucket and produces
//! no file record. Conflicts are never reported here; only the merge path
//! (see [`crate::core::merge`]) reports them.

use serde::Serialize;

/// Branch name reported when HEAD does not point at a branch.
pub const DETACHED_PLACEHOLDER: &str = "HEAD";

/// Presence of a path in the HEAD commit tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HeadFlag {
    Absent,
    Present,
}

/// State of a path in the working directory, relative to HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkdirFlag {
    Absent,
    Unchanged,
    Modified,
}

/// State of a path in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageFlag {
    Absent,
    /// Index entry matches HEAD.
    Unchanged,
    /// Index entry matches the working directory but not HEAD.
    Modified,
    /// Unresolved conflict (or an entry matching neither side).
    Conflict,
}

impl HeadFlag {
    /// Decode the numeric matrix value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Absent),
            1 => Some(Self::Present),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Present => 1,
        }
    }
}

impl WorkdirFlag {
    /// Decode the numeric matrix value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Absent),
            1 => Some(Self::Unchanged),
            2 => Some(Self::Modified),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Unchanged => 1,
            Self::Modified => 2,
        }
    }
}

impl StageFlag {
    /// Decode the numeric matrix value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Absent),
            1 => Some(Self::Unchanged),
            2 => Some(Self::Modified),
            3 => Some(Self::Conflict),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Unchanged => 1,
            Self::Modified => 2,
            Self::Conflict => 3,
        }
    }
}

/// One row of the status matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub path: String,
    pub head: HeadFlag,
    pub workdir: WorkdirFlag,
    pub stage: StageFlag,
}

impl StatusRow {
    pub fn new(
        path: impl Into<String>,
        head: HeadFlag,
        workdir: WorkdirFlag,
        stage: StageFlag,
    ) -> Self {
        Self {
            path: path.into(),
            head,
            workdir,
            stage,
        }
    }

    /// Build a row from numeric matrix values.
    ///
    /// Returns `None` if any value is outside its column's range.
    ///
    /// ```
    /// use gitshim::core::status::{StatusRow, StageFlag};
    ///
    /// let row = StatusRow::from_codes("a.txt", 1, 2, 3).unwrap();
    /// assert_eq!(row.stage, StageFlag::Conflict);
    /// assert!(StatusRow::from_codes("a.txt", 2, 0, 0).is_none());
    /// ```
    pub fn from_codes(path: impl Into<String>, head: u8, workdir: u8, stage: u8) -> Option<Self> {
        Some(Self::new(
            path,
            HeadFlag::from_code(head)?,
            WorkdirFlag::from_code(workdir)?,
            StageFlag::from_code(stage)?,
        ))
    }

    /// The `(head, workdir, stage)` numeric triple.
    pub fn codes(&self) -> (u8, u8, u8) {
        (self.head.code(), self.workdir.code(), self.stage.code())
    }
}

/// The recognized rows of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileClass {
    /// New file not yet added to the index.
    NotAdded,
    /// New file staged for commit.
    Created,
    /// Modified file with the change staged.
    ModifiedStaged,
    /// Modified file with the change only in the working tree.
    ModifiedUnstaged,
    /// Deleted file with the removal staged.
    DeletedStaged,
    /// Deleted from the working tree but still in the index.
    DeletedUnstaged,
}

impl FileClass {
    /// Look a row up in the classification table.
    pub fn of(row: &StatusRow) -> Option<Self> {
        use HeadFlag as H;
        use StageFlag as S;
        use WorkdirFlag as W;

        match (row.head, row.workdir, row.stage) {
            (H::Absent, W::Modified, S::Absent) => Some(Self::NotAdded),
            (H::Absent, W::Modified, S::Modified) => Some(Self::Created),
            (H::Present, W::Modified, S::Modified) => Some(Self::ModifiedStaged),
            (H::Present, W::Modified, S::Unchanged) => Some(Self::ModifiedUnstaged),
            (H::Present, W::Absent, S::Absent) => Some(Self::DeletedStaged),
            (H::Present, W::Absent, S::Unchanged) => Some(Self::DeletedUnstaged),
            _ => None,
        }
    }

    /// The `(index, working_dir)` marker pair for this class.
    pub fn markers(self) -> (char, char) {
        match self {
            Self::NotAdded => ('?', '?'),
            Self::Created => ('A', ' '),
            Self::ModifiedStaged => ('M', ' '),
            Self::ModifiedUnstaged => (' ', 'M'),
            Self::DeletedStaged => ('D', ' '),
            Self::DeletedUnstaged => (' ', 'D'),
        }
    }

    /// Whether the change is recorded in the index.
    pub fn is_staged(self) -> bool {
        matches!(
            self,
            Self::Created | Self::ModifiedStaged | Self::DeletedStaged
        )
    }
}

/// Per-file status record with index and working-tree markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub index: char,
    pub working_dir: char,
}

/// Summary of the working tree, shaped like the familiar client's status result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusResult {
    pub not_added: Vec<String>,
    /// Always empty on the status path.
    pub conflicted: Vec<String>,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// Always empty: unrecognized rows are dropped rather than bucketed.
    pub ignored: Vec<String>,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
    pub files: Vec<FileStatus>,
    pub ahead: usize,
    pub behind: usize,
    pub current: String,
    pub tracking: Option<String>,
    pub detached: bool,
}

impl StatusResult {
    /// Whether no path matched any row of the classification table.
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

/// Classify a status matrix.
///
/// `current_branch` is `None` when HEAD is detached or unborn; the summary
/// then reports [`DETACHED_PLACEHOLDER`] as the current branch.
///
/// ```
/// use gitshim::core::status::{classify_status, StatusRow};
///
/// let rows = vec![StatusRow::from_codes("lib.rs", 1, 2, 2).unwrap()];
/// let status = classify_status(&rows, Some("main"));
///
/// assert_eq!(status.modified, vec!["lib.rs"]);
/// assert_eq!(status.staged, vec!["lib.rs"]);
/// assert_eq!(status.files[0].index, 'M');
/// assert_eq!(status.files[0].working_dir, ' ');
/// ```
pub fn classify_status(rows: &[StatusRow], current_branch: Option<&str>) -> StatusResult {
    let mut result = StatusResult {
        current: current_branch.unwrap_or(DETACHED_PLACEHOLDER).to_string(),
        detached: current_branch.is_none(),
        ..StatusResult::default()
    };

    for row in rows {
        let Some(class) = FileClass::of(row) else {
            continue;
        };

        let path = row.path.clone();
        match class {
            FileClass::NotAdded => result.not_added.push(path.clone()),
            FileClass::Created => result.created.push(path.clone()),
            FileClass::ModifiedStaged | FileClass::ModifiedUnstaged => {
                result.modified.push(path.clone())
            }
            FileClass::DeletedStaged | FileClass::DeletedUnstaged => {
                result.deleted.push(path.clone())
            }
        }
        if class.is_staged() {
            result.staged.push(path.clone());
        }

        let (index, working_dir) = class.markers();
        result.files.push(FileStatus {
            path,
            index,
            working_dir,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(h: u8, w: u8, s: u8) -> StatusRow {
        StatusRow::from_codes("file.txt", h, w, s).unwrap()
    }

    fn classify_one(h: u8, w: u8, s: u8) -> StatusResult {
        classify_status(&[row(h, w, s)], Some("main"))
    }

    mod table {
        use super::*;

        #[test]
        fn untracked() {
            let status = classify_one(0, 2, 0);
            assert_eq!(status.not_added, vec!["file.txt"]);
            assert!(status.staged.is_empty());
            assert_eq!((status.files[0].index, status.files[0].working_dir), ('?', '?'));
        }

        #[test]
        fn created_and_staged() {
            let status = classify_one(0, 2, 2);
            assert_eq!(status.created, vec!["file.txt"]);
            assert_eq!(status.staged, vec!["file.txt"]);
            assert_eq!((status.files[0].index, status.files[0].working_dir), ('A', ' '));
        }

        #[test]
        fn modified_and_staged() {
            let status = classify_one(1, 2, 2);
            assert_eq!(status.modified, vec!["file.txt"]);
            assert_eq!(status.staged, vec!["file.txt"]);
            assert_eq!((status.files[0].index, status.files[0].working_dir), ('M', ' '));
        }

        #[test]
        fn modified_unstaged() {
            let status = classify_one(1, 2, 1);
            assert_eq!(status.modified, vec!["file.txt"]);
            assert!(status.staged.is_empty());
            assert_eq!((status.files[0].index, status.files[0].working_dir), (' ', 'M'));
        }

        #[test]
        fn deleted_and_staged() {
            let status = classify_one(1, 0, 0);
            assert_eq!(status.deleted, vec!["file.txt"]);
            assert_eq!(status.staged, vec!["file.txt"]);
            assert_eq!((status.files[0].index, status.files[0].working_dir), ('D', ' '));
        }

        #[test]
        fn deleted_unstaged() {
            let status = classify_one(1, 0, 1);
            assert_eq!(status.deleted, vec!["file.txt"]);
            assert!(status.staged.is_empty());
            assert_eq!((status.files[0].index, status.files[0].working_dir), (' ', 'D'));
        }

        #[test]
        fn unchanged_file_is_dropped() {
            let status = classify_one(1, 1, 1);
            assert!(status.is_clean());
            assert!(status.modified.is_empty());
        }

        #[test]
        fn conflict_rows_are_not_reported() {
            let status = classify_one(1, 2, 3);
            assert!(status.conflicted.is_empty());
            assert!(status.files.is_empty());
        }

        #[test]
        fn partially_staged_new_file_is_dropped() {
            // added, then edited again in the working tree
            let status = classify_one(0, 2, 3);
            assert!(status.files.is_empty());
            assert!(status.created.is_empty());
        }
    }

    #[test]
    fn detached_head_uses_placeholder() {
        let status = classify_status(&[], None);
        assert_eq!(status.current, DETACHED_PLACEHOLDER);
        assert!(status.detached);
    }

    #[test]
    fn branch_is_reported() {
        let status = classify_status(&[], Some("feature"));
        assert_eq!(status.current, "feature");
        assert!(!status.detached);
        assert!(status.ignored.is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let rows = vec![
            StatusRow::from_codes("b", 0, 2, 0).unwrap(),
            StatusRow::from_codes("a", 0, 2, 0).unwrap(),
        ];
        let status = classify_status(&rows, Some("main"));
        assert_eq!(status.not_added, vec!["b", "a"]);
    }

    #[test]
    fn codes_roundtrip_through_flags() {
        let r = row(1, 0, 3);
        assert_eq!(r.codes(), (1, 0, 3));
    }

    #[test]
    fn out_of_range_codes_rejected() {
        assert!(StatusRow::from_codes("x", 0, 3, 0).is_none());
        assert!(StatusRow::from_codes("x", 0, 0, 4).is_none());
    }
}
