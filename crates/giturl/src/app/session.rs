//! Editor session state: the active document's repository context and the commands that use it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;

use crate::app::context::ContextBuilder;
use crate::app::selection::first_line_range;
use crate::app::url::UrlGenerator;
use crate::domain::model::{LineRange, RepoData, RevisionKind, Selection};
use crate::infra::browser::BrowserOpener;
use crate::infra::git::GitQueries;

/// Commands an editor can bind to menu entries or key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorCommand {
    OpenCommitUrl,
    OpenBranchUrl,
    OpenDefaultBranchUrl,
}

impl EditorCommand {
    pub const ALL: [EditorCommand; 3] = [
        EditorCommand::OpenCommitUrl,
        EditorCommand::OpenBranchUrl,
        EditorCommand::OpenDefaultBranchUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditorCommand::OpenCommitUrl => "open_commit_url",
            EditorCommand::OpenBranchUrl => "open_branch_url",
            EditorCommand::OpenDefaultBranchUrl => "open_default_branch_url",
        }
    }

    pub fn revision_kind(&self) -> RevisionKind {
        match self {
            EditorCommand::OpenCommitUrl => RevisionKind::CurrentCommit,
            EditorCommand::OpenBranchUrl => RevisionKind::CurrentBranch,
            EditorCommand::OpenDefaultBranchUrl => RevisionKind::DefaultBranch,
        }
    }
}

impl From<RevisionKind> for EditorCommand {
    fn from(kind: RevisionKind) -> Self {
        match kind {
            RevisionKind::CurrentCommit => EditorCommand::OpenCommitUrl,
            RevisionKind::CurrentBranch => EditorCommand::OpenBranchUrl,
            RevisionKind::DefaultBranch => EditorCommand::OpenDefaultBranchUrl,
        }
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorCommand {
    type Err = EditorCommandParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EditorCommand::ALL
            .into_iter()
            .find(|command| command.as_str() == value.trim())
            .ok_or_else(|| EditorCommandParseError::UnknownCommand(value.trim().to_string()))
    }
}

/// Error returned when parsing an [`EditorCommand`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EditorCommandParseError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

/// A context menu entry offered for the active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub caption: &'static str,
    pub revision: RevisionKind,
}

/// The document the editor last activated and its repository context, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub path: PathBuf,
    pub repo: Option<RepoData>,
}

#[derive(Debug, Default)]
struct SessionState {
    activations: u64,
    active: Option<ActiveDocument>,
}

/// Per-editor session owning the repository context of the active document.
///
/// Activations rebuild the context from scratch; only the most recent activation's result is
/// kept.
pub struct Session<G> {
    builder: Arc<ContextBuilder<G>>,
    generator: UrlGenerator,
    opener: Box<dyn BrowserOpener>,
    state: Arc<Mutex<SessionState>>,
}

impl<G: GitQueries + 'static> Session<G> {
    pub fn new(
        builder: ContextBuilder<G>,
        generator: UrlGenerator,
        opener: impl BrowserOpener + 'static,
    ) -> Self {
        Self {
            builder: Arc::new(builder),
            generator,
            opener: Box::new(opener),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Rebuild the context for `path` on a background thread.
    pub fn activate(&self, path: impl Into<PathBuf>) -> JoinHandle<()> {
        let path = path.into();
        let activation = self.begin_activation();
        let builder = Arc::clone(&self.builder);
        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            let repo = build_context(&builder, &path);
            store(&state, activation, ActiveDocument { path, repo });
        })
    }

    /// Rebuild the context for `path` on the calling thread.
    pub fn activate_blocking(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let activation = self.begin_activation();
        let repo = build_context(&self.builder, &path);
        store(&self.state, activation, ActiveDocument { path, repo });
    }

    fn begin_activation(&self) -> u64 {
        let mut state = self.state.lock();
        state.activations += 1;
        state.activations
    }

    pub fn active_document(&self) -> Option<ActiveDocument> {
        self.state.lock().active.clone()
    }

    pub fn repo_data(&self) -> Option<RepoData> {
        self.active_document().and_then(|document| document.repo)
    }

    /// URL `command` would open, anchored to the first selection.
    pub fn url_for(&self, command: EditorCommand, selections: &[Selection]) -> Option<String> {
        self.url_for_lines(command, first_line_range(selections))
    }

    pub fn url_for_lines(
        &self,
        command: EditorCommand,
        lines: Option<LineRange>,
    ) -> Option<String> {
        let repo = self.repo_data()?;
        Some(self.generator.generate(&repo, command.revision_kind(), lines))
    }

    /// Run `command`, opening the generated URL. A no-op returning `None` when the active
    /// document has no repository context.
    pub fn invoke(
        &self,
        command: EditorCommand,
        selections: &[Selection],
    ) -> Result<Option<String>> {
        self.invoke_with_lines(command, first_line_range(selections))
    }

    pub fn invoke_with_lines(
        &self,
        command: EditorCommand,
        lines: Option<LineRange>,
    ) -> Result<Option<String>> {
        let Some(url) = self.url_for_lines(command, lines) else {
            tracing::info!(%command, "no repository context for the active document");
            return Ok(None);
        };
        self.opener.open(&url)?;
        Ok(Some(url))
    }

    /// Menu entries to offer for the active document.
    pub fn menu(&self) -> Vec<MenuEntry> {
        self.repo_data().as_ref().map(menu_for).unwrap_or_default()
    }
}

fn build_context<G: GitQueries>(builder: &ContextBuilder<G>, path: &Path) -> Option<RepoData> {
    match builder.build(path) {
        Ok(repo) => Some(repo),
        Err(err) => {
            tracing::info!(path = %path.display(), reason = %err, "url commands unavailable");
            None
        }
    }
}

fn store(state: &Mutex<SessionState>, activation: u64, document: ActiveDocument) {
    let mut state = state.lock();
    if state.activations != activation {
        tracing::debug!(
            path = %document.path.display(),
            "discarding context from superseded activation"
        );
        return;
    }
    state.active = Some(document);
}

/// Menu layout for `repo`. On the default branch a single branch entry is offered, pointing at
/// the default branch.
pub fn menu_for(repo: &RepoData) -> Vec<MenuEntry> {
    let mut entries = vec![MenuEntry {
        caption: "Open Commit Url...",
        revision: RevisionKind::CurrentCommit,
    }];

    if repo.current_branch != repo.default_branch {
        entries.push(MenuEntry {
            caption: "Open Branch Url...",
            revision: RevisionKind::CurrentBranch,
        });
        entries.push(MenuEntry {
            caption: "Open Default Branch Url...",
            revision: RevisionKind::DefaultBranch,
        });
    } else {
        entries.push(MenuEntry {
            caption: "Open Branch Url...",
            revision: RevisionKind::DefaultBranch,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc::{self, Receiver, Sender};

    use crate::domain::model::Position;

    #[derive(Clone, Default)]
    struct RecordingBrowser {
        opened: Arc<Mutex<Vec<String>>>,
    }

    impl BrowserOpener for RecordingBrowser {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().push(url.to_owned());
            Ok(())
        }
    }

    /// Repositories live under `/repos/<name>`; anything else is outside git.
    struct StaticGit;

    impl GitQueries for StaticGit {
        fn toplevel(&self, dir: &Path) -> String {
            let mut components = dir.components().skip(1);
            match (components.next(), components.next()) {
                (Some(first), Some(name)) if first.as_os_str() == "repos" => {
                    format!("/repos/{}", name.as_os_str().to_string_lossy())
                }
                _ => String::new(),
            }
        }

        fn remote_origin(&self, repo_root: &Path) -> Option<String> {
            let name = repo_root.file_name()?.to_string_lossy().into_owned();
            (name != "local").then(|| format!("git@github.com:acme/{name}.git"))
        }

        fn default_branch(&self, _repo_root: &Path) -> String {
            "main".into()
        }

        fn current_branch(&self, repo_root: &Path) -> String {
            if repo_root.ends_with("widgets") {
                "feature/login".into()
            } else {
                "main".into()
            }
        }

        fn last_commit(&self, _repo_root: &Path, _path: &str) -> String {
            "abc123".into()
        }
    }

    fn session() -> (Session<StaticGit>, RecordingBrowser) {
        let browser = RecordingBrowser::default();
        let session = Session::new(
            ContextBuilder::new(StaticGit),
            UrlGenerator::default(),
            browser.clone(),
        );
        (session, browser)
    }

    #[test]
    fn commands_are_noops_without_context() {
        let (session, browser) = session();
        assert_eq!(
            session.invoke(EditorCommand::OpenCommitUrl, &[]).unwrap(),
            None
        );

        session.activate_blocking("/tmp/scratch.txt");
        assert_eq!(
            session.invoke(EditorCommand::OpenBranchUrl, &[]).unwrap(),
            None
        );
        assert!(session.menu().is_empty());
        assert!(browser.opened.lock().is_empty());
    }

    #[test]
    fn invoke_opens_url_for_first_selection() {
        let (session, browser) = session();
        session
            .activate("/repos/widgets/src/main.go")
            .join()
            .expect("activation thread");

        let selections = [
            Selection::new(Position::new(9, 0), Position::new(15, 0)),
            Selection::caret(Position::new(40, 2)),
        ];
        let url = session
            .invoke(EditorCommand::OpenCommitUrl, &selections)
            .unwrap();

        let expected = "https://github.com/acme/widgets/blob/abc123/src/main.go#L10-L15";
        assert_eq!(url.as_deref(), Some(expected));
        assert_eq!(*browser.opened.lock(), vec![expected.to_owned()]);
    }

    #[test]
    fn each_command_uses_its_revision() {
        let (session, _browser) = session();
        session.activate_blocking("/repos/widgets/lib.rs");

        let branch = session.url_for(EditorCommand::OpenBranchUrl, &[]);
        let default = session.url_for(EditorCommand::OpenDefaultBranchUrl, &[]);
        assert_eq!(
            branch.as_deref(),
            Some("https://github.com/acme/widgets/blob/feature/login/lib.rs")
        );
        assert_eq!(
            default.as_deref(),
            Some("https://github.com/acme/widgets/blob/main/lib.rs")
        );
    }

    #[test]
    fn activation_replaces_previous_context() {
        let (session, _browser) = session();
        session.activate_blocking("/repos/widgets/lib.rs");
        assert!(session.repo_data().is_some());

        session.activate_blocking("/repos/local/lib.rs");
        let document = session.active_document().expect("document");
        assert_eq!(document.path, PathBuf::from("/repos/local/lib.rs"));
        assert_eq!(document.repo, None);
    }

    /// Blocks inside `toplevel` until released, to hold an activation in flight.
    struct GatedGit {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl GitQueries for GatedGit {
        fn toplevel(&self, dir: &Path) -> String {
            if dir.starts_with("/repos/slow") {
                let _ = self.entered.lock().send(());
                let _ = self.release.lock().recv();
            }
            StaticGit.toplevel(dir)
        }

        fn remote_origin(&self, repo_root: &Path) -> Option<String> {
            StaticGit.remote_origin(repo_root)
        }

        fn default_branch(&self, repo_root: &Path) -> String {
            StaticGit.default_branch(repo_root)
        }

        fn current_branch(&self, repo_root: &Path) -> String {
            StaticGit.current_branch(repo_root)
        }

        fn last_commit(&self, repo_root: &Path, path: &str) -> String {
            StaticGit.last_commit(repo_root, path)
        }
    }

    #[test]
    fn latest_activation_wins() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let git = GatedGit {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let session = Session::new(
            ContextBuilder::new(git),
            UrlGenerator::default(),
            RecordingBrowser::default(),
        );

        let slow = session.activate("/repos/slow/a.rs");
        entered_rx.recv().expect("slow activation started");
        session.activate_blocking("/repos/widgets/b.rs");
        release_tx.send(()).expect("release slow activation");
        slow.join().expect("slow activation thread");

        let document = session.active_document().expect("document");
        assert_eq!(document.path, PathBuf::from("/repos/widgets/b.rs"));
        assert_eq!(
            document.repo.map(|repo| repo.repo),
            Some("widgets".to_owned())
        );
    }

    #[test]
    fn menu_on_feature_branch_offers_three_entries() {
        let (session, _browser) = session();
        session.activate_blocking("/repos/widgets/lib.rs");

        let revisions: Vec<_> = session.menu().into_iter().map(|entry| entry.revision).collect();
        assert_eq!(
            revisions,
            vec![
                RevisionKind::CurrentCommit,
                RevisionKind::CurrentBranch,
                RevisionKind::DefaultBranch,
            ]
        );
    }

    #[test]
    fn menu_on_default_branch_points_branch_entry_at_default() {
        let (session, _browser) = session();
        session.activate_blocking("/repos/gadgets/lib.rs");

        let menu = session.menu();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[1].caption, "Open Branch Url...");
        assert_eq!(menu[1].revision, RevisionKind::DefaultBranch);
    }

    #[test]
    fn command_names_round_trip() {
        for command in EditorCommand::ALL {
            assert_eq!(command.as_str().parse::<EditorCommand>(), Ok(command));
            assert_eq!(EditorCommand::from(command.revision_kind()), command);
        }
        assert!("open_tag_url".parse::<EditorCommand>().is_err());
    }
}
