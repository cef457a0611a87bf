//! Process entry: run the wired daemon until told to stop.

use std::io;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use crate::bootstrap::{BootstrapError, ConfigLoader, bootstrap_with};
use crate::health::HealthReporter;
use crate::transport::ListenerError;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification source cannot be
    /// installed.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Errors surfaced while launching or stopping the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Wiring failed before the daemon could serve.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The bus listener failed to start or to stop cleanly.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// Waiting for shutdown failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Bootstraps the daemon, serves the bus, and blocks until shutdown.
///
/// # Errors
///
/// Returns [`LaunchError`] when wiring, serving, or shutdown handling
/// fails.
pub fn run_daemon(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    let listener = daemon.serve()?;

    shutdown.wait()?;

    listener.shutdown();
    listener.join()?;
    info!(target: PROCESS_TARGET, "daemon stopped");
    Ok(())
}
