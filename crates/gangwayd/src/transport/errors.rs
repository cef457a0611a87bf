//! Error types for the bus listener.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while binding or running the bus listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Resolving the configured TCP host failed.
    #[error("failed to resolve '{host}:{port}': {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },

    /// The configured TCP host resolved to no usable address.
    #[error("'{host}:{port}' resolved to no address")]
    NoAddress {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },

    /// Binding the TCP listener failed.
    #[error("failed to bind tcp listener on {addr}: {source}")]
    BindTcp {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying bind error.
        #[source]
        source: io::Error,
    },

    /// Binding the Unix listener failed.
    #[error("failed to bind unix listener on '{path}': {source}")]
    BindUnix {
        /// Socket path that could not be bound.
        path: String,
        /// Underlying bind error.
        #[source]
        source: io::Error,
    },

    /// Inspecting an existing socket path failed.
    #[error("failed to inspect existing socket path '{path}': {source}")]
    StaleSocketCheck {
        /// Socket path under inspection.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// The configured socket path exists but is not a socket.
    #[error("path '{path}' exists and is not a socket")]
    NotASocket {
        /// Offending path.
        path: String,
    },

    /// Another daemon is already serving the configured socket.
    #[error("socket '{path}' is already in use")]
    AlreadyListening {
        /// Socket path in use.
        path: String,
    },

    /// Removing a stale socket file failed.
    #[error("failed to remove stale socket '{path}': {source}")]
    RemoveStale {
        /// Stale socket path.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// Switching the listener to non-blocking accepts failed.
    #[error("failed to configure non-blocking accepts: {source}")]
    NonBlocking {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Unix domain sockets are not available on this platform.
    #[error("unix socket endpoint '{endpoint}' is unsupported on this platform")]
    UnixUnsupported {
        /// Configured endpoint.
        endpoint: String,
    },

    /// The accept-loop thread panicked.
    #[error("bus listener thread panicked")]
    ThreadPanic,
}
