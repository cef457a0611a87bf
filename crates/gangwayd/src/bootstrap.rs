//! Daemon wiring orchestration.
//!
//! Wiring order is deliberate: the sender is built before any handler, so
//! every handler is born with its emission path attached; the registry is
//! validated and sealed before the listener can deliver a single frame.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;
use tracing::debug;

use gangway_config::{Config, SocketSetupError};

use crate::dispatch::{DISPATCH_TARGET, Dispatcher, HandlerRegistry, RegistryError, Sender};
use crate::handlers::{HandlerContext, builtin_handlers};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{BusListener, ClientSink, ClientSlot, InboundHandler, ListenerError, ListenerHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any configuration layer fails.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare bus socket: {source}")]
    Socket {
        /// Filesystem error preparing the socket directory.
        #[source]
        source: SocketSetupError,
    },
    /// The handler list failed registry validation.
    #[error("failed to build handler registry: {source}")]
    Registry {
        /// Underlying registration conflict.
        #[source]
        source: RegistryError,
    },
}

/// A fully wired daemon, ready to serve its bus.
pub struct Daemon {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    slot: ClientSlot,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured endpoint and starts accepting the UI client.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound or the
    /// accept loop cannot start.
    pub fn serve(&self) -> Result<ListenerHandle, ListenerError> {
        let listener = BusListener::bind(self.config.bus_socket())?;
        let handle = listener.start(
            Arc::clone(&self.dispatcher) as Arc<dyn InboundHandler>,
            self.slot.clone(),
        )?;
        self.reporter.listener_active(self.config.bus_socket());
        Ok(handle)
    }
}

/// Wires the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] at the first wiring stage that fails; the
/// reporter observes the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.bus_socket().prepare_filesystem() {
        let error = BootstrapError::Socket { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    // Sender first, then handlers: the emission path exists before any
    // handler that could use it.
    let slot = ClientSlot::default();
    let sender = Arc::new(Sender::new(Box::new(ClientSink::new(slot.clone()))));
    let context = HandlerContext::new(sender);

    let registry = match HandlerRegistry::build(builtin_handlers(&context)) {
        Ok(registry) => registry,
        Err(source) => {
            let error = BootstrapError::Registry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };
    debug!(
        target: DISPATCH_TARGET,
        commands = ?registry.commands().collect::<Vec<_>>(),
        "handler registry sealed"
    );
    reporter.registry_ready(registry.len());

    let dispatcher = Arc::new(Dispatcher::new(registry));
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        dispatcher,
        slot,
        telemetry,
        reporter,
    })
}
