//! The command-handler contract.

use gangway_protocol::Envelope;

/// A named unit of domain behaviour invoked for one command.
///
/// Handlers receive each routed envelope already marked as a response in
/// progress. They own the payload decode, perform their domain work,
/// directly or on a worker they spawn, and push zero or more frames
/// through the sender. The dispatch core tracks no handler state and never
/// inspects what a handler does with the envelope.
pub trait CommandHandler: Send + Sync {
    /// Command name this handler answers, matched case-sensitively.
    fn command(&self) -> &str;

    /// Consumes one routed envelope.
    ///
    /// Invoked synchronously on the transport's delivery thread; blocking
    /// work must be moved off this path so subsequent frames keep flowing.
    fn handle(&self, envelope: Envelope);
}

/// Adapter pairing a command name with a handling closure, for declarative
/// registration lists.
pub struct FnHandler {
    command: String,
    handle: Box<dyn Fn(Envelope) + Send + Sync>,
}

impl FnHandler {
    /// Wraps `handle` as the handler for `command`.
    pub fn new(
        command: impl Into<String>,
        handle: impl Fn(Envelope) + Send + Sync + 'static,
    ) -> Self {
        Self {
            command: command.into(),
            handle: Box::new(handle),
        }
    }

    /// Boxed variant, convenient for registration lists.
    pub fn boxed(
        command: impl Into<String>,
        handle: impl Fn(Envelope) + Send + Sync + 'static,
    ) -> Box<dyn CommandHandler> {
        Box::new(Self::new(command, handle))
    }
}

impl CommandHandler for FnHandler {
    fn command(&self) -> &str {
        &self.command
    }

    fn handle(&self, envelope: Envelope) {
        (self.handle)(envelope);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn fn_handler_reports_its_command() {
        let handler = FnHandler::new("helo", |_| {});
        assert_eq!(handler.command(), "helo");
    }

    #[test]
    fn fn_handler_invokes_closure_with_envelope() {
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let seen = std::sync::Arc::new(Mutex::new(String::new()));
        let handler = {
            let calls = std::sync::Arc::clone(&calls);
            let seen = std::sync::Arc::clone(&seen);
            FnHandler::new("ping", move |envelope| {
                calls.fetch_add(1, Ordering::SeqCst);
                *seen.lock().expect("seen lock") = envelope.command;
            })
        };

        let envelope = Envelope::decode(br#"{"command":"ping"}"#).expect("decode");
        handler.handle(envelope);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().expect("seen lock"), "ping");
    }
}
