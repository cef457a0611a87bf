//! Shared doubles and harnesses for daemon tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use gangway_protocol::Envelope;

use crate::transport::{BusSink, SinkError};

/// Sink double that records every pushed frame.
///
/// Clones share the same frame log, so a test can hand one clone to the
/// sender and keep another for assertions.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    frames: Arc<Mutex<Vec<String>>>,
    fail_next: Arc<AtomicBool>,
}

impl RecordingSink {
    /// Snapshot of all recorded frames, in push order.
    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().expect("frames lock").clone()
    }

    /// Makes the next push fail with an IO error.
    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Recorded frames decoded as envelopes, filtered by command.
    pub(crate) fn decoded_frames_for(&self, command: &str) -> Vec<Envelope> {
        self.frames()
            .iter()
            .map(|frame| Envelope::decode(frame.as_bytes()).expect("recorded frame decodes"))
            .filter(|envelope| envelope.command == command)
            .collect()
    }
}

impl BusSink for RecordingSink {
    fn push(&mut self, frame: &str) -> Result<(), SinkError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SinkError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected sink failure",
            )));
        }
        self.frames.lock().expect("frames lock").push(frame.to_owned());
        Ok(())
    }
}
