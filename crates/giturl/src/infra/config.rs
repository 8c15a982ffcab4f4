//! Configuration management utilities.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::hosts::{HostRegistry, HostTemplateSet};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".giturl/config.toml";

/// Environment variable overriding `browser.command`.
pub const BROWSER_ENV: &str = "GITURL_BROWSER";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: Browser,
    /// Host template sets merged over the built-in registry, keyed by domain.
    #[serde(default)]
    pub domains: BTreeMap<String, HostTemplateSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Browser {
    /// Browser executable; the system default handler is used when unset.
    #[serde(default)]
    pub command: Option<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    browser: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            browser: env::var(BROWSER_ENV).ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(browser: &str) -> Self {
        Self {
            browser: Some(browser.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration for work in the current directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir()?;
        Self::load_for(&cwd, explicit)
    }

    /// Load configuration from defaults, user/global config, the workspace config of the
    /// repository containing `start`, an explicit file, and env overrides.
    pub fn load_for(start: &Path, explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path(start);
        Self::load_with_layers(global, workspace, explicit.map(Path::to_path_buf), env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        explicit: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        if let Some(explicit_path) = explicit {
            layers.push(Self::from_file(&explicit_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            browser: merge_browser(self.browser, other.browser),
            domains: merge_domains(self.domains, other.domains),
        }
    }

    /// The built-in host registry with the configured domains merged in.
    pub fn registry(&self) -> HostRegistry {
        HostRegistry::builtin().with_entries(self.domains.clone())
    }
}

fn merge_browser(base: Browser, overlay: Browser) -> Browser {
    Browser {
        command: overlay.command.or(base.command),
    }
}

/// Whole template sets from `overlay` replace those in `base` with the same key.
fn merge_domains(
    mut base: BTreeMap<String, HostTemplateSet>,
    overlay: BTreeMap<String, HostTemplateSet>,
) -> BTreeMap<String, HostTemplateSet> {
    base.extend(overlay);
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("giturl/config.toml"))
}

fn workspace_config_path(start: &Path) -> Option<PathBuf> {
    find_repo_root(start).map(|root| root.join(DEFAULT_WORKSPACE_CONFIG_PATH))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(browser) = env.browser {
        config.browser.command = Some(browser);
    }
    config
}
