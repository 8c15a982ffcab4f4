//! Git integration utilities.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

const REMOTE_ORIGIN_KEY: &str = "remote.origin.url=";
const ORIGIN_REF_PREFIX: &str = "refs/remotes/origin/";

/// Queries the repository context builder needs from git.
///
/// Every query answers with trimmed text; an empty string means git had nothing to report.
pub trait GitQueries: Send + Sync {
    /// Absolute path of the working tree containing `dir`.
    fn toplevel(&self, dir: &Path) -> String;

    /// URL of the `origin` remote, if configured.
    fn remote_origin(&self, repo_root: &Path) -> Option<String>;

    /// Branch the `origin` remote's HEAD points to, without the `refs/remotes/origin/` prefix.
    fn default_branch(&self, repo_root: &Path) -> String;

    /// Abbreviated name of `HEAD`.
    fn current_branch(&self, repo_root: &Path) -> String;

    /// Hash of the most recent commit reachable from `HEAD` that touched `path`.
    fn last_commit(&self, repo_root: &Path, path: &str) -> String;
}

/// [`GitQueries`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git in `dir` and return its trimmed stdout, or empty text on any failure.
    fn output(&self, dir: &Path, args: &[&str]) -> String {
        match self.try_output(dir, args) {
            Ok(stdout) => stdout,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), ?args, error = %err, "git query failed");
                String::new()
            }
        }
    }

    fn try_output(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("failed to spawn {}", self.program.display()))?;

        if !output.status.success() {
            return Err(anyhow!("git exited with status {}", output.status));
        }

        let stdout = String::from_utf8(output.stdout).context("git produced non-utf8 output")?;
        Ok(stdout.trim().to_owned())
    }
}

impl GitQueries for GitCli {
    fn toplevel(&self, dir: &Path) -> String {
        self.output(dir, &["rev-parse", "--show-toplevel"])
    }

    fn remote_origin(&self, repo_root: &Path) -> Option<String> {
        find_remote_origin(&self.output(repo_root, &["config", "--list"]))
    }

    fn default_branch(&self, repo_root: &Path) -> String {
        let head = self.output(repo_root, &["symbolic-ref", "refs/remotes/origin/HEAD"]);
        strip_origin_prefix(&head).to_owned()
    }

    fn current_branch(&self, repo_root: &Path) -> String {
        self.output(repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn last_commit(&self, repo_root: &Path, path: &str) -> String {
        self.output(repo_root, &["rev-list", "-1", "HEAD", "--", path])
    }
}

/// First `remote.origin.url=` entry of `git config --list` output.
fn find_remote_origin(config_list: &str) -> Option<String> {
    config_list
        .lines()
        .find_map(|line| line.strip_prefix(REMOTE_ORIGIN_KEY))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
}

fn strip_origin_prefix(reference: &str) -> &str {
    reference
        .strip_prefix(ORIGIN_REF_PREFIX)
        .unwrap_or(reference)
}
