//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a file has no browsable repository context.
///
/// None of these are surfaced to the user; commands simply become no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("not inside a git repository: {0}")]
    NotAGitRepo(PathBuf),
    #[error("{path} is not inside repository root {root}")]
    OutsideRepository { path: PathBuf, root: PathBuf },
    #[error("repository has no remote origin")]
    NoRemoteOrigin,
    #[error("unrecognized remote url '{0}'")]
    UnparseableRemote(String),
}
