//! Structured lifecycle reporting for daemon wiring events.

use std::sync::Arc;

use gangway_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;

/// Observer surfacing wiring lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after the daemon is fully wired.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when wiring fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the handler registry is validated and sealed.
    fn registry_ready(&self, commands: usize);

    /// Invoked when the bus listener starts accepting clients.
    fn listener_active(&self, endpoint: &SocketEndpoint);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn registry_ready(&self, commands: usize) {
        (**self).registry_ready(commands);
    }

    fn listener_active(&self, endpoint: &SocketEndpoint) {
        (**self).listener_active(endpoint);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            bus = %config.bus_socket(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn registry_ready(&self, commands: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_ready",
            commands,
            "handler registry sealed"
        );
    }

    fn listener_active(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_active",
            endpoint = %endpoint,
            "bus listener accepting clients"
        );
    }
}
