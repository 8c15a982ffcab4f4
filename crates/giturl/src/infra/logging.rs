//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, in `tracing` env-filter syntax.
pub const LOG_ENV: &str = "GITURL_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber so stdout stays reserved for command output.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
