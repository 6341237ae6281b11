//! Logging setup for the command-line host
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Builds the filter for `config`. `RUST_LOG` takes precedence when set.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()))
}

/// Installs the global `fmt` subscriber.
///
/// Calling this twice is harmless: the second installation is ignored.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.show_target)
        .with_writer(std::io::stderr)
        .try_init();
}
