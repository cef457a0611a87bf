//! The inbound dispatch loop.

use tracing::{debug, warn};

use gangway_protocol::Envelope;

use crate::transport::InboundHandler;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::registry::HandlerRegistry;

/// Routes each inbound frame to exactly one registered handler.
///
/// The dispatcher holds no per-connection or cross-message state: every
/// frame starts fresh, and any terminal failure (an undecodable frame, an
/// empty or unknown command) is logged and dropped without a reply. Not
/// answering is deliberate: the remote side treats silence as the failure
/// signal, and synthesizing an error frame here would change the protocol
/// for deployed clients.
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher over an immutable registry.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher routes through.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Decodes and routes one frame.
    ///
    /// On success the resolved handler has been invoked exactly once, with
    /// the envelope re-marked as a response in progress. The routing path
    /// performs no I/O; anything slower than a map lookup belongs to the
    /// handler.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for undecodable frames and unroutable
    /// commands. Both are terminal for this frame only.
    pub fn dispatch(&self, raw: &[u8]) -> Result<(), DispatchError> {
        let envelope =
            Envelope::decode(raw).map_err(|source| DispatchError::MalformedMessage { source })?;

        if envelope.command.is_empty() {
            return Err(DispatchError::EmptyCommand);
        }
        let Some(handler) = self.registry.lookup(&envelope.command) else {
            return Err(DispatchError::UnknownCommand {
                command: envelope.command,
            });
        };

        debug!(
            target: DISPATCH_TARGET,
            command = %envelope.command,
            "dispatching command"
        );
        handler.handle(envelope.into_response());
        Ok(())
    }
}

impl InboundHandler for Dispatcher {
    fn on_message(&self, raw: &[u8]) {
        match self.dispatch(raw) {
            Ok(()) => {}
            Err(error @ DispatchError::MalformedMessage { .. }) => {
                warn!(target: DISPATCH_TARGET, %error, "dropping undecodable frame");
            }
            Err(error @ DispatchError::EmptyCommand) => {
                warn!(target: DISPATCH_TARGET, %error, "dropping frame without a command");
            }
            Err(DispatchError::UnknownCommand { command }) => {
                warn!(target: DISPATCH_TARGET, command = %command, "unknown command");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use gangway_protocol::EnvelopeKind;

    use super::*;
    use crate::dispatch::{FnHandler, HandlerRegistry};

    struct CountingHandlers {
        ping: Arc<AtomicUsize>,
        pong: Arc<AtomicUsize>,
        dispatcher: Dispatcher,
    }

    fn counting_dispatcher() -> CountingHandlers {
        let ping = Arc::new(AtomicUsize::new(0));
        let pong = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::build(vec![
            {
                let ping = Arc::clone(&ping);
                FnHandler::boxed("ping", move |_| {
                    ping.fetch_add(1, Ordering::SeqCst);
                })
            },
            {
                let pong = Arc::clone(&pong);
                FnHandler::boxed("pong", move |_| {
                    pong.fetch_add(1, Ordering::SeqCst);
                })
            },
        ])
        .expect("build registry");
        CountingHandlers {
            ping,
            pong,
            dispatcher: Dispatcher::new(registry),
        }
    }

    #[test]
    fn routes_to_exactly_one_handler() {
        let harness = counting_dispatcher();
        harness
            .dispatcher
            .dispatch(br#"{"command":"ping","data":{}}"#)
            .expect("dispatch ping");

        assert_eq!(harness.ping.load(Ordering::SeqCst), 1);
        assert_eq!(harness.pong.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_command_invokes_no_handler() {
        let harness = counting_dispatcher();
        let result = harness
            .dispatcher
            .dispatch(br#"{"command":"unknown","data":{}}"#);

        assert!(matches!(
            result,
            Err(DispatchError::UnknownCommand { command }) if command == "unknown"
        ));
        assert_eq!(harness.ping.load(Ordering::SeqCst), 0);
        assert_eq!(harness.pong.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_frame_invokes_no_handler() {
        let harness = counting_dispatcher();
        let result = harness.dispatcher.dispatch(b"not json at all");

        assert!(matches!(
            result,
            Err(DispatchError::MalformedMessage { .. })
        ));
        assert_eq!(harness.ping.load(Ordering::SeqCst), 0);
        assert_eq!(harness.pong.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_command_is_rejected_before_lookup() {
        let harness = counting_dispatcher();
        let result = harness.dispatcher.dispatch(br#"{"command":""}"#);
        assert!(matches!(result, Err(DispatchError::EmptyCommand)));
    }

    #[test]
    fn handler_receives_envelope_marked_as_response() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let registry = HandlerRegistry::build(vec![{
            let seen = Arc::clone(&seen);
            FnHandler::boxed("probe", move |envelope| {
                *seen.lock().expect("seen lock") = Some(envelope.kind);
            })
        }])
        .expect("build registry");

        Dispatcher::new(registry)
            .dispatch(br#"{"command":"probe","data":{"n":1}}"#)
            .expect("dispatch");

        assert_eq!(
            *seen.lock().expect("seen lock"),
            Some(EnvelopeKind::Response)
        );
    }

    #[test]
    fn dispatch_failures_do_not_poison_subsequent_frames() {
        let harness = counting_dispatcher();
        harness.dispatcher.on_message(b"garbage");
        harness.dispatcher.on_message(br#"{"command":"unknown"}"#);
        harness.dispatcher.on_message(br#"{"command":"ping"}"#);

        assert_eq!(harness.ping.load(Ordering::SeqCst), 1);
    }
}
