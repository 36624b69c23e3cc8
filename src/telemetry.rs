//! Tracing subscriber setup for binaries embedding the engine.

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Installs a global `fmt` subscriber filtered by `config.level`.
///
/// `RUST_LOG` takes precedence when set. An unparseable level falls back to
/// `info`.
///
/// # Errors
///
/// Returns [`TelemetryError::Install`] when a global subscriber is already
/// set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config);
    let installed = match config.format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init(),
    };
    installed.map_err(|err| TelemetryError::Install(err.to_string()))
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
