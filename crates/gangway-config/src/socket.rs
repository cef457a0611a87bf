//! Socket endpoint configuration for the daemon bus.

use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Where the daemon bus listens for its UI client.
///
/// Endpoints are written as `unix:///run/user/1000/gangway/gangwayd.sock`
/// or `tcp://127.0.0.1:9717` in configuration files, environment
/// variables, and CLI flags.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket at the given path.
    Unix {
        /// Filesystem location of the socket.
        path: Utf8PathBuf,
    },
    /// TCP socket bound to a host and port.
    Tcp {
        /// Host name or address to bind.
        host: String,
        /// Port to bind.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket path for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the socket's parent directory with owner-only permissions.
    ///
    /// TCP endpoints need no filesystem preparation and return `Ok(())`
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SocketSetupError`] when the path has no parent directory
    /// or the directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketSetupError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent() else {
            return Err(SocketSetupError::NoParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketSetupError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => parse_unix(&url, input),
            "tcp" => parse_tcp(&url, input),
            other => Err(EndpointParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn parse_unix(url: &Url, input: &str) -> Result<SocketEndpoint, EndpointParseError> {
    let path = url.path();
    if path.is_empty() {
        return Err(EndpointParseError::MissingUnixPath(input.to_owned()));
    }
    Ok(SocketEndpoint::unix(path))
}

fn parse_tcp(url: &Url, input: &str) -> Result<SocketEndpoint, EndpointParseError> {
    let host = url
        .host_str()
        .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
    let port = url
        .port()
        .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
    Ok(SocketEndpoint::tcp(host, port))
}

/// Errors raised while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Scheme other than `unix` or `tcp`.
    #[error("unsupported bus endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP endpoint without a host.
    #[error("missing host in bus endpoint '{0}'")]
    MissingHost(String),
    /// TCP endpoint without a port.
    #[error("missing port in bus endpoint '{0}'")]
    MissingPort(String),
    /// Unix endpoint without a path.
    #[error("missing socket path in bus endpoint '{0}'")]
    MissingUnixPath(String),
    /// Input was not a URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised while preparing the socket directory.
#[derive(Debug, Error)]
pub enum SocketSetupError {
    /// Socket path has no parent directory to create.
    #[error("socket path '{path}' has no parent directory")]
    NoParent {
        /// Offending socket path.
        path: Utf8PathBuf,
    },
    /// Creating the parent directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}
