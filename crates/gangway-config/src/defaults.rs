//! Built-in defaults applied beneath file, environment, and CLI layers.

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

#[cfg(unix)]
use camino::Utf8PathBuf;

/// TCP port used when a Unix domain socket is not available.
pub const DEFAULT_TCP_PORT: u16 = 9717;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter default, used where serde requires an allocation.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default log output format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::default()
}

/// Computes the default bus endpoint for the daemon.
///
/// On Unix this is a socket under the user's runtime directory, falling
/// back to a per-uid namespace below the system temporary directory when no
/// runtime directory is advertised. Elsewhere the daemon listens on
/// loopback TCP.
#[must_use]
#[cfg(unix)]
pub fn default_socket_endpoint() -> SocketEndpoint {
    let base = dirs::runtime_dir()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .unwrap_or_else(per_uid_fallback);
    SocketEndpoint::unix(base.join("gangway").join("gangwayd.sock"))
}

/// Computes the default bus endpoint for the daemon.
#[must_use]
#[cfg(not(unix))]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}

#[cfg(unix)]
fn per_uid_fallback() -> Utf8PathBuf {
    let temp = Utf8PathBuf::from_path_buf(std::env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
    let uid = unsafe { libc::geteuid() };
    temp.join(format!("gangway-uid-{uid}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn unix_default_ends_with_socket_name() {
        let endpoint = default_socket_endpoint();
        let path = endpoint.unix_path().expect("unix endpoint");
        assert!(path.as_str().ends_with("gangway/gangwayd.sock"));
    }

    #[test]
    fn filter_default_is_info() {
        assert_eq!(default_log_filter(), "info");
        assert_eq!(default_log_filter_string(), "info");
    }
}
