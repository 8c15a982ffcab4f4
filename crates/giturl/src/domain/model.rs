//! Domain models for repositories, revisions, and editor selections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which revision a generated URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    CurrentCommit,
    CurrentBranch,
    DefaultBranch,
}

impl RevisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionKind::CurrentCommit => "current_commit",
            RevisionKind::CurrentBranch => "current_branch",
            RevisionKind::DefaultBranch => "default_branch",
        }
    }
}

impl fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to build browse URLs for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoData {
    pub domain: String,
    pub user: String,
    pub repo: String,
    /// Path relative to the repository root, `/`-separated, no leading separator.
    pub path: String,
    pub current_commit: String,
    pub current_branch: String,
    pub default_branch: String,
}

impl RepoData {
    /// The revision string for `kind`. May be empty when git could not report it.
    pub fn revision(&self, kind: RevisionKind) -> &str {
        match kind {
            RevisionKind::CurrentCommit => &self.current_commit,
            RevisionKind::CurrentBranch => &self.current_branch,
            RevisionKind::DefaultBranch => &self.default_branch,
        }
    }
}

/// A 0-based cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A selection between two cursor positions, in either drag direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty selection, i.e. a bare cursor.
    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn begin(&self) -> Position {
        self.start.min(self.end)
    }

    pub fn finish(&self) -> Position {
        self.start.max(self.end)
    }
}

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(line: usize) -> Self {
        Self::new(line, line)
    }

    pub fn is_single_line(&self) -> bool {
        self.start == self.end
    }
}
