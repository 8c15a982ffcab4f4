//! Infrastructure adapters for git, the browser, configuration, and logging.

pub mod browser;
pub mod config;
pub mod git;
pub mod logging;
