//! The synchronized outbound funnel.

use std::sync::{Mutex, PoisonError};

use tracing::warn;

use gangway_protocol::Envelope;

use crate::transport::BusSink;

use super::DISPATCH_TARGET;
use super::errors::EmitError;

/// Process-wide emission point for outbound envelopes.
///
/// Every frame leaving the daemon passes through [`Sender::emit`], which
/// encodes and pushes under one mutex so no two emissions interleave their
/// transport writes. The sender is constructed before any handler at wiring
/// time and handed to each by reference, so there is no window in which a
/// handler could run without an attached emission path.
///
/// Emission is fire-and-forget: encode and transport failures are logged
/// and the frame is dropped. The sender never retries and never reports
/// back to the handler that asked for the emit.
pub struct Sender {
    sink: Mutex<Box<dyn BusSink>>,
}

impl Sender {
    /// Creates a sender over the transport's outbound sink.
    #[must_use]
    pub fn new(sink: Box<dyn BusSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Serializes the envelope and pushes it onto the bus.
    ///
    /// The envelope is serialized wholesale; the sender neither inspects
    /// nor mutates its command or payload.
    pub fn emit(&self, envelope: Envelope) {
        if let Err(error) = self.try_emit(&envelope) {
            warn!(
                target: DISPATCH_TARGET,
                command = %envelope.command,
                %error,
                "outbound frame dropped"
            );
        }
    }

    fn try_emit(&self, envelope: &Envelope) -> Result<(), EmitError> {
        // Handlers emit from arbitrary threads; a panic while holding the
        // guard must not wedge the bus for every later emission.
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let frame = envelope.encode().map_err(EmitError::Encode)?;
        sink.push(&frame)?;
        Ok(())
    }
}
