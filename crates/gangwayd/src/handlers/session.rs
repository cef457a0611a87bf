//! Session handshake.

use serde::Serialize;

use crate::dispatch::{CommandHandler, FnHandler};

use super::{HandlerContext, respond};

/// Wire protocol revision reported to connecting clients.
const PROTOCOL_REVISION: u32 = 1;

#[derive(Debug, Serialize)]
struct HeloResponse {
    name: &'static str,
    version: &'static str,
    protocol: u32,
}

/// `helo`: first command a UI client sends; replies with the daemon
/// identity so the client can verify it is talking to a compatible bridge.
pub(crate) fn helo(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    FnHandler::boxed("helo", move |envelope| {
        let payload = HeloResponse {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            protocol: PROTOCOL_REVISION,
        };
        respond(&sender, &envelope, &payload);
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gangway_protocol::{Envelope, EnvelopeKind};

    use super::*;
    use crate::dispatch::Sender;
    use crate::tests::support::RecordingSink;

    #[test]
    fn helo_replies_with_daemon_identity() {
        let sink = RecordingSink::default();
        let sender = Arc::new(Sender::new(Box::new(sink.clone())));
        let context = HandlerContext::new(sender);
        let handler = helo(&context);

        let envelope = Envelope::decode(br#"{"command":"helo"}"#).expect("decode");
        handler.handle(envelope.into_response());

        let frames = sink.frames();
        assert_eq!(frames.len(), 1);
        let reply = Envelope::decode(frames[0].as_bytes()).expect("reply decodes");
        assert_eq!(reply.command, "helo");
        assert_eq!(reply.kind, EnvelopeKind::Response);

        let data = reply.data.expect("payload present");
        let value: serde_json::Value = serde_json::from_str(data.get()).expect("payload parses");
        assert_eq!(value["name"], "gangwayd");
        assert_eq!(value["protocol"], 1);
    }
}
