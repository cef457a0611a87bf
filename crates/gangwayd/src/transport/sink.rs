//! Outbound frame delivery to the attached UI client.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::connection::ConnectionStream;

/// Outbound half of the transport boundary.
///
/// One call pushes one complete frame. Implementations do not buffer across
/// calls and do not retry.
pub trait BusSink: Send {
    /// Pushes one already-encoded frame, appending the JSONL delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when no client is attached or the write fails.
    fn push(&mut self, frame: &str) -> Result<(), SinkError>;
}

/// Errors raised while pushing a frame to the transport.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No UI client is currently attached to the bus.
    #[error("no client attached to the bus")]
    Detached,
    /// Writing to the client connection failed.
    #[error("failed to write frame to the bus: {0}")]
    Io(#[from] io::Error),
}

#[derive(Default)]
struct SlotState {
    stream: Option<ConnectionStream>,
    generation: u64,
}

/// Shared slot tracking the write half of the attached UI client.
///
/// The listener attaches a connection on accept and releases it when the
/// read loop ends; a later attachment supersedes an earlier one, so a stale
/// reader exiting cannot detach its successor.
#[derive(Clone, Default)]
pub struct ClientSlot {
    state: Arc<Mutex<SlotState>>,
}

impl ClientSlot {
    /// Attaches a client writer, superseding any previous attachment.
    /// Returns the generation token identifying this attachment.
    pub(crate) fn attach(&self, stream: ConnectionStream) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.stream = Some(stream);
        state.generation
    }

    /// Clears the slot if `generation` still identifies the attached client.
    pub(crate) fn release(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation {
            state.stream = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // Attachment state stays usable even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sink that forwards frames to whichever UI client is attached.
pub struct ClientSink {
    slot: ClientSlot,
}

impl ClientSink {
    /// Creates a sink over the slot the listener attaches clients to.
    #[must_use]
    pub fn new(slot: ClientSlot) -> Self {
        Self { slot }
    }
}

impl BusSink for ClientSink {
    fn push(&mut self, frame: &str) -> Result<(), SinkError> {
        let mut state = self.slot.lock();
        let stream = state.stream.as_mut().ok_or(SinkError::Detached)?;
        stream.write_all(frame.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};
    use std::net::{TcpListener, TcpStream};

    use super::*;

    fn attached_pair(slot: &ClientSlot) -> (TcpStream, u64) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let client = TcpStream::connect(addr).expect("connect");
        let (server, _) = listener.accept().expect("accept");
        let generation = slot.attach(ConnectionStream::Tcp(server));
        (client, generation)
    }

    #[test]
    fn push_without_client_reports_detached() {
        let mut sink = ClientSink::new(ClientSlot::default());
        let result = sink.push("{\"command\":\"helo\"}");
        assert!(matches!(result, Err(SinkError::Detached)));
    }

    #[test]
    fn push_delivers_one_line_per_frame() {
        let slot = ClientSlot::default();
        let (client, _) = attached_pair(&slot);
        let mut sink = ClientSink::new(slot);

        sink.push("{\"command\":\"helo\"}").expect("push");
        let mut line = String::new();
        BufReader::new(client).read_line(&mut line).expect("read");
        assert_eq!(line, "{\"command\":\"helo\"}\n");
    }

    #[test]
    fn stale_release_does_not_detach_successor() {
        let slot = ClientSlot::default();
        let (_old_client, old_generation) = attached_pair(&slot);
        let (client, _) = attached_pair(&slot);

        slot.release(old_generation);
        let mut sink = ClientSink::new(slot);
        sink.push("{\"command\":\"helo\"}").expect("push after stale release");

        let mut line = String::new();
        BufReader::new(client).read_line(&mut line).expect("read");
        assert!(line.contains("helo"));
    }

    #[test]
    fn release_detaches_current_client() {
        let slot = ClientSlot::default();
        let (_client, generation) = attached_pair(&slot);
        slot.release(generation);

        let mut sink = ClientSink::new(slot);
        let result = sink.push("{\"command\":\"helo\"}");
        assert!(matches!(result, Err(SinkError::Detached)));
    }
}
