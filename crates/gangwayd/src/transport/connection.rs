//! Accepted client connections and the inbound delivery loop.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use tracing::{debug, warn};

use super::TRANSPORT_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Largest frame the daemon accepts from a client.
pub(crate) const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Inbound half of the transport boundary.
///
/// Implementations are invoked once per frame, on the transport's reader
/// thread, in delivery order. They must not block on I/O: any long-running
/// work belongs on a worker the implementation spawns.
pub trait InboundHandler: Send + Sync + 'static {
    /// Delivers one raw JSONL frame, newline included.
    fn on_message(&self, raw: &[u8]);
}

/// Stream types the bus listener accepts.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Clones the underlying socket handle so the write half can be
    /// attached to the outbound sink while the read half is drained.
    pub(crate) fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Drains a client connection, delivering complete frames in order.
///
/// Returns when the client disconnects, a read fails, or an unterminated
/// frame outgrows [`MAX_FRAME_BYTES`]. A trailing frame without a final
/// newline is still delivered on EOF.
pub(crate) fn run_read_loop(mut stream: ConnectionStream, inbound: &dyn InboundHandler) {
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0_u8; 1024];

    loop {
        let bytes_read = match read_with_retry(&mut stream, &mut chunk) {
            Ok(n) => n,
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, %error, "client read failed");
                return;
            }
        };

        if bytes_read == 0 {
            if !buffer.is_empty() {
                inbound.on_message(&buffer);
            }
            debug!(target: TRANSPORT_TARGET, "client disconnected");
            return;
        }

        buffer.extend_from_slice(&chunk[..bytes_read]);
        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let frame: Vec<u8> = buffer.drain(..=pos).collect();
            inbound.on_message(&frame);
        }

        if buffer.len() > MAX_FRAME_BYTES {
            warn!(
                target: TRANSPORT_TARGET,
                size = buffer.len(),
                "dropping client: frame exceeds maximum size"
            );
            return;
        }
    }
}

fn read_with_retry(stream: &mut ConnectionStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(n) => return Ok(n),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::*;

    #[derive(Default)]
    struct RecordingInbound {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl InboundHandler for Arc<RecordingInbound> {
        fn on_message(&self, raw: &[u8]) {
            self.frames
                .lock()
                .expect("frames lock")
                .push(raw.to_vec());
        }
    }

    fn connected_pair() -> (TcpStream, ConnectionStream) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let client = TcpStream::connect(addr).expect("connect");
        let (server, _) = listener.accept().expect("accept");
        (client, ConnectionStream::Tcp(server))
    }

    #[test]
    fn delivers_frames_in_arrival_order() {
        let (mut client, server) = connected_pair();
        let inbound = Arc::new(RecordingInbound::default());
        let reader = {
            let inbound = Arc::clone(&inbound);
            thread::spawn(move || run_read_loop(server, &inbound))
        };

        client
            .write_all(b"{\"command\":\"first\"}\n{\"command\":\"second\"}\n")
            .expect("write");
        drop(client);
        reader.join().expect("join reader");

        let frames = inbound.frames.lock().expect("frames lock");
        assert_eq!(frames.len(), 2);
        assert!(frames[0].starts_with(b"{\"command\":\"first\"}"));
        assert!(frames[1].starts_with(b"{\"command\":\"second\"}"));
    }

    #[test]
    fn delivers_trailing_frame_on_eof() {
        let (mut client, server) = connected_pair();
        let inbound = Arc::new(RecordingInbound::default());
        let reader = {
            let inbound = Arc::clone(&inbound);
            thread::spawn(move || run_read_loop(server, &inbound))
        };

        client.write_all(b"{\"command\":\"last\"}").expect("write");
        drop(client);
        reader.join().expect("join reader");

        let frames = inbound.frames.lock().expect("frames lock");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], b"{\"command\":\"last\"}".to_vec());
    }
}
