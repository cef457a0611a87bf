//! Bus listener binding the configured endpoint and accepting UI clients.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use gangway_config::SocketEndpoint;

use super::connection::run_read_loop;
use super::sink::ClientSlot;
use super::{ConnectionStream, InboundHandler, ListenerError, TRANSPORT_TARGET};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to the configured bus endpoint.
#[derive(Debug)]
pub struct BusListener {
    endpoint: SocketEndpoint,
    listener: ListenerKind,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl BusListener {
    /// Binds the endpoint, clearing a stale Unix socket left by a previous
    /// daemon that is no longer accepting.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when resolution or binding fails, or when
    /// another process is already serving the Unix socket.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let listener = match endpoint {
            SocketEndpoint::Tcp { host, port } => ListenerKind::Tcp(bind_tcp(host, *port)?),
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    ListenerKind::Unix(bind_unix(path.as_std_path())?)
                }

                #[cfg(not(unix))]
                {
                    return Err(ListenerError::UnixUnsupported {
                        endpoint: endpoint.to_string(),
                    });
                }
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Local address of the bound TCP listener, if any.
    ///
    /// Useful when binding port 0; Unix listeners report `None`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            ListenerKind::Unix(_) => None,
        }
    }

    /// Starts the accept loop on a background thread.
    ///
    /// Each accepted client has its write half attached to `slot` and its
    /// read half drained through `inbound` on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NonBlocking`] when the listener cannot be
    /// switched to non-blocking accepts.
    pub fn start(
        self,
        inbound: Arc<dyn InboundHandler>,
        slot: ClientSlot,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        } {
            #[cfg(unix)]
            remove_socket_file(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || run_accept_loop(&self, &shutdown_flag, inbound, slot));
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle controlling the background accept loop.
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Requests the accept loop to stop after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the loop thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &BusListener,
    shutdown: &AtomicBool,
    inbound: Arc<dyn InboundHandler>,
    slot: ClientSlot,
) {
    info!(
        target: TRANSPORT_TARGET,
        endpoint = %listener.endpoint,
        "bus listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_client(listener) {
            Ok(Some(stream)) => {
                last_error = None;
                serve_client(stream, &inbound, &slot);
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(target: TRANSPORT_TARGET, %error, "bus accept failed");
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }

    #[cfg(unix)]
    remove_socket_file(&listener.endpoint);
}

/// Attaches the client's write half and drains its read half on a new
/// thread. The slot is released with the attachment's generation token, so
/// a superseding client is never detached by a stale reader exiting.
fn serve_client(stream: ConnectionStream, inbound: &Arc<dyn InboundHandler>, slot: &ClientSlot) {
    let writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(error) => {
            warn!(target: TRANSPORT_TARGET, %error, "failed to split client connection");
            return;
        }
    };
    let generation = slot.attach(writer);
    info!(target: TRANSPORT_TARGET, generation, "client attached");

    let inbound = Arc::clone(inbound);
    let slot = slot.clone();
    thread::spawn(move || {
        run_read_loop(stream, inbound.as_ref());
        slot.release(generation);
        info!(target: TRANSPORT_TARGET, generation, "client detached");
    });
}

fn accept_client(listener: &BusListener) -> io::Result<Option<ConnectionStream>> {
    match &listener.listener {
        ListenerKind::Tcp(tcp) => match tcp.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(ConnectionStream::Tcp(stream)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
        #[cfg(unix)]
        ListenerKind::Unix(unix) => match unix.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(ConnectionStream::Unix(stream)))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        },
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| ListenerError::NoAddress {
        host: host.to_owned(),
        port,
    })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

/// Binds a Unix socket, removing a leftover socket file when nothing is
/// accepting on it any more.
#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        reclaim_socket_path(path)?;
    }
    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn reclaim_socket_path(path: &Path) -> Result<(), ListenerError> {
    let display = || path.display().to_string();

    let metadata = fs::symlink_metadata(path).map_err(|source| ListenerError::StaleSocketCheck {
        path: display(),
        source,
    })?;
    if !metadata.file_type().is_socket() {
        return Err(ListenerError::NotASocket { path: display() });
    }

    match UnixStream::connect(path) {
        Ok(_live) => Err(ListenerError::AlreadyListening { path: display() }),
        Err(error)
            if error.kind() == io::ErrorKind::ConnectionRefused
                || error.kind() == io::ErrorKind::NotFound =>
        {
            fs::remove_file(path).map_err(|source| ListenerError::RemoveStale {
                path: display(),
                source,
            })
        }
        Err(source) => Err(ListenerError::StaleSocketCheck {
            path: display(),
            source,
        }),
    }
}

#[cfg(unix)]
fn remove_socket_file(endpoint: &SocketEndpoint) {
    let Some(path) = endpoint.unix_path() else {
        return;
    };
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: TRANSPORT_TARGET,
            %error,
            path = %path,
            "failed to remove bus socket file"
        );
    }
}
