//! Opening URLs in a web browser.

use anyhow::{Context, Result};

/// Something that can show a URL to the user.
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler, or a configured browser command.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    command: Option<String>,
}

impl SystemBrowser {
    pub fn new(command: Option<String>) -> Self {
        let command = command.filter(|command| !command.trim().is_empty());
        Self { command }
    }
}

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        match &self.command {
            Some(command) => {
                tracing::info!(url, browser = %command, "opening url");
                open::with(url, command.as_str())
                    .with_context(|| format!("failed to open {url} with {command}"))
            }
            None => {
                tracing::info!(url, "opening url");
                open::that(url).with_context(|| format!("failed to open {url} in a browser"))
            }
        }
    }
}
