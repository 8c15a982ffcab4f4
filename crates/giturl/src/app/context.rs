//! Assembling repository context for a file.

use std::path::{Component, Path, PathBuf};

use crate::app::remote::RemoteOrigin;
use crate::domain::errors::ContextError;
use crate::domain::model::RepoData;
use crate::infra::git::GitQueries;

/// Gathers [`RepoData`] for files through a [`GitQueries`] backend.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder<G> {
    git: G,
}

impl<G: GitQueries> ContextBuilder<G> {
    pub fn new(git: G) -> Self {
        Self { git }
    }

    /// Build the repository context for the absolute path `file`.
    ///
    /// The repository root and a parseable `origin` remote are required. Branch and commit
    /// queries that fail leave their field empty.
    pub fn build(&self, file: &Path) -> Result<RepoData, ContextError> {
        let dir = file.parent().unwrap_or(file);
        let toplevel = self.git.toplevel(dir);
        if toplevel.is_empty() {
            return Err(ContextError::NotAGitRepo(dir.to_path_buf()));
        }
        let root = PathBuf::from(toplevel);

        let path = relative_path(file, &root).ok_or_else(|| ContextError::OutsideRepository {
            path: file.to_path_buf(),
            root: root.clone(),
        })?;

        let remote = self
            .git
            .remote_origin(&root)
            .ok_or(ContextError::NoRemoteOrigin)?;
        let origin =
            RemoteOrigin::parse(&remote).ok_or(ContextError::UnparseableRemote(remote))?;

        let default_branch = self.git.default_branch(&root);
        let current_branch = self.git.current_branch(&root);
        let current_commit = self.git.last_commit(&root, &path);
        for (field, value) in [
            ("default_branch", &default_branch),
            ("current_branch", &current_branch),
            ("current_commit", &current_commit),
        ] {
            if value.is_empty() {
                tracing::debug!(field, root = %root.display(), "git reported no value");
            }
        }

        Ok(RepoData {
            domain: origin.domain,
            user: origin.user,
            repo: origin.repo,
            path,
            current_commit,
            current_branch,
            default_branch,
        })
    }
}

/// `file` relative to `root` as a `/`-separated path. `None` unless `file` lies strictly
/// inside `root`.
fn relative_path(file: &Path, root: &Path) -> Option<String> {
    lexical_relative_path(file, root).or_else(|| {
        // git reports a resolved root; the file may sit behind a symlink or a `..` segment
        let file = file.canonicalize().ok()?;
        let root = root.canonicalize().ok()?;
        lexical_relative_path(&file, &root)
    })
}

fn lexical_relative_path(file: &Path, root: &Path) -> Option<String> {
    let segments: Vec<String> = file
        .strip_prefix(root)
        .ok()?
        .components()
        .map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<_>>()?;

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
