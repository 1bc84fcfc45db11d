//! Structured logging setup.
//!
//! Logs go to stderr so they never mix with query results on stdout.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

fn filter_from_config(config: &Config) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Install a global `tracing` subscriber at the configured level.
///
/// If a global subscriber is already set this is a no-op; the first one
/// installed wins.
pub fn init_logging(config: &Config) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
