//! Logging setup
//!
//! Stdout carries protocol messages, so every log line goes to stderr.

use crate::types::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber at `info`, overridable through `RUST_LOG`.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_logger() {
    init_logger_with_level(LogLevel::Info);
}

/// Install the global subscriber with a default level
pub fn init_logger_with_level(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::from(level).into())
        .from_env_lossy();

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();

    if installed.is_err() {
        tracing::trace!("logger already initialized");
    }
}
