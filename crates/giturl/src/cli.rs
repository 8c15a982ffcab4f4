//! Command line entry point.
//!
//! Each invocation plays the editor's part once: activate a file, then run one command on it.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use crate::app::context::ContextBuilder;
use crate::app::hosts::HostTemplateSet;
use crate::app::selection::first_line_range;
use crate::app::session::{EditorCommand, MenuEntry, Session, menu_for};
use crate::app::url::UrlGenerator;
use crate::domain::model::{LineRange, RepoData, RevisionKind, Selection};
use crate::infra::browser::SystemBrowser;
use crate::infra::config::Config;
use crate::infra::git::GitCli;

#[derive(Debug, Parser)]
#[command(
    name = "giturl",
    author,
    version,
    about = "Open a file from a local git checkout on its hosting service",
    long_about = None
)]
pub struct Cli {
    /// Extra configuration file, layered over the global and workspace files.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the file at the last commit that touched it.
    Commit(OpenArgs),
    /// Open the file on the current branch.
    Branch(OpenArgs),
    /// Open the file on the remote's default branch.
    DefaultBranch(OpenArgs),
    /// Show the repository context and menu entries for a file.
    Info {
        file: PathBuf,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective host templates as TOML.
    Hosts,
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct OpenArgs {
    /// File to open.
    file: PathBuf,
    /// Editor selection, 0-based. Repeatable; only the first one anchors the URL.
    #[arg(long = "selection", value_name = "ROW:COL[-ROW:COL]", conflicts_with = "lines")]
    selections: Vec<Selection>,
    /// Line or line range to anchor, 1-based.
    #[arg(long, value_name = "N[-M]")]
    lines: Option<LineRange>,
    /// Print the URL instead of opening a browser.
    #[arg(long)]
    print: bool,
}

impl OpenArgs {
    fn line_range(&self) -> Option<LineRange> {
        self.lines.or_else(|| first_line_range(&self.selections))
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let Cli { config, command } = self;
        let config = config.as_deref();
        match command {
            Commands::Commit(args) => open(RevisionKind::CurrentCommit, &args, config),
            Commands::Branch(args) => open(RevisionKind::CurrentBranch, &args, config),
            Commands::DefaultBranch(args) => open(RevisionKind::DefaultBranch, &args, config),
            Commands::Info { file, json } => info(&file, json, config),
            Commands::Hosts => hosts(config),
            Commands::Completions { shell } => {
                let mut command = Cli::command();
                clap_complete::generate(shell, &mut command, "giturl", &mut io::stdout());
                Ok(())
            }
        }
    }
}

fn open(kind: RevisionKind, args: &OpenArgs, config_path: Option<&Path>) -> Result<()> {
    let file = absolute_file(&args.file)?;
    let config = load_config(Some(&file), config_path)?;
    let session = Session::new(
        ContextBuilder::new(GitCli::new()),
        UrlGenerator::new(config.registry()),
        SystemBrowser::new(config.browser.command.clone()),
    );

    session
        .activate(&file)
        .join()
        .map_err(|_| anyhow!("repository context task panicked"))?;

    let command = EditorCommand::from(kind);
    let lines = args.line_range();
    if args.print {
        if let Some(url) = session.url_for_lines(command, lines) {
            writeln!(io::stdout(), "{url}").context("failed to write url")?;
        }
        return Ok(());
    }

    session.invoke_with_lines(command, lines)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct InfoReport<'a> {
    #[serde(flatten)]
    repo: &'a RepoData,
    host: &'a str,
    menu: Vec<MenuEntry>,
}

fn info(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let file = absolute_file(file)?;
    let config = load_config(Some(&file), config_path)?;
    let registry = config.registry();
    let mut stdout = io::stdout().lock();

    let repo = match ContextBuilder::new(GitCli::new()).build(&file) {
        Ok(repo) => repo,
        Err(err) => {
            tracing::info!(path = %file.display(), reason = %err, "url commands unavailable");
            if json {
                writeln!(stdout, "null")?;
            } else {
                writeln!(stdout, "unavailable: {err}")?;
            }
            return Ok(());
        }
    };

    let report = InfoReport {
        repo: &repo,
        host: registry.resolve_key(&repo.domain),
        menu: menu_for(&repo),
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize repository info")?;
        writeln!(stdout, "{rendered}")?;
        return Ok(());
    }

    for (label, value) in [
        ("domain", repo.domain.as_str()),
        ("user", repo.user.as_str()),
        ("repo", repo.repo.as_str()),
        ("path", repo.path.as_str()),
        ("current_commit", repo.current_commit.as_str()),
        ("current_branch", repo.current_branch.as_str()),
        ("default_branch", repo.default_branch.as_str()),
        ("host", report.host),
    ] {
        writeln!(stdout, "{label:<16}{value}")?;
    }
    writeln!(stdout)?;
    writeln!(stdout, "menu:")?;
    for entry in &report.menu {
        writeln!(stdout, "  {:<28}{}", entry.caption, entry.revision)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct HostsListing<'a> {
    domains: BTreeMap<&'a str, &'a HostTemplateSet>,
}

fn hosts(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(None, config_path)?;
    let registry = config.registry();
    let listing = HostsListing {
        domains: registry.entries(),
    };
    let rendered = toml::to_string_pretty(&listing).context("failed to render host templates")?;
    write!(io::stdout(), "{rendered}").context("failed to write host templates")?;
    Ok(())
}

fn load_config(file: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
    match file.and_then(Path::parent) {
        Some(dir) => Config::load_for(dir, explicit),
        None => Config::load(explicit),
    }
}

fn absolute_file(file: &Path) -> Result<PathBuf> {
    std::path::absolute(file).with_context(|| format!("invalid file path: {}", file.display()))
}
