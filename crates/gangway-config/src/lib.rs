//! Layered configuration shared by the gangway daemon and its tooling.
//!
//! Values resolve in precedence order: built-in defaults, then the
//! configuration file, then `GANGWAY_*` environment variables, then CLI
//! flags. Loading is delegated to `ortho_config`; this crate owns the
//! schema, the defaults, and the endpoint/log-format value types.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, default_log_filter, default_log_filter_string,
    default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{EndpointParseError, SocketEndpoint, SocketSetupError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "GANGWAY")]
pub struct Config {
    /// Endpoint the daemon bus listens on for its UI client.
    #[serde(default = "defaults::default_socket_endpoint")]
    pub bus_socket: SocketEndpoint,
    /// Log filter expression understood by `tracing_subscriber::EnvFilter`.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer fails to parse or merge.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration from an explicit argument iterator.
    ///
    /// # Errors
    ///
    /// Returns the loader error when any layer fails to parse or merge.
    pub fn load_from_iter<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator,
        I::Item: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Endpoint the daemon bus listens on.
    #[must_use]
    pub fn bus_socket(&self) -> &SocketEndpoint {
        &self.bus_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_socket: defaults::default_socket_endpoint(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_builtin_defaults() {
        let config = Config::default();
        assert_eq!(config.bus_socket(), &default_socket_endpoint());
        assert_eq!(config.log_filter(), default_log_filter());
        assert_eq!(config.log_format(), default_log_format());
    }

    #[test]
    fn endpoint_override_survives_struct_update() {
        let config = Config {
            bus_socket: SocketEndpoint::tcp("127.0.0.1", 9001),
            ..Config::default()
        };
        assert_eq!(config.bus_socket(), &SocketEndpoint::tcp("127.0.0.1", 9001));
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    }
}
