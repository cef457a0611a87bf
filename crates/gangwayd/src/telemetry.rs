//! Structured telemetry initialisation for the daemon.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use gangway_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression failed to parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Installing the global tracing subscriber failed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Repeated calls are idempotent: only the first invocation touches global
/// state, and later callers receive a fresh [`TelemetryHandle`] without
/// reinstalling anything.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter fails to parse or the
/// subscriber cannot be installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|()| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    // Logs go to stderr: stdout belongs to nothing here, and the desktop
    // shell that supervises the daemon collects stderr.
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialise_is_idempotent() {
        let config = Config::default();
        let first = initialise(&config).expect("first install");
        let second = initialise(&config).expect("second install is a no-op");
        drop((first, second));
    }

    #[test]
    fn rejects_invalid_filter_expression() {
        // Only observable before the global guard is set; afterwards the
        // invalid filter is never parsed. Run against a fresh config when
        // this test executes first in the process.
        let config = Config {
            log_filter: "not==a==filter".to_owned(),
            ..Config::default()
        };
        let result = initialise(&config);
        if TELEMETRY_GUARD.get().is_none() {
            assert!(matches!(result, Err(TelemetryError::Filter(_))));
        }
    }
}
