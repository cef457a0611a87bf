//! The envelope model and its JSONL codec.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::errors::CodecError;

/// Discriminates the direction and outcome of an envelope.
///
/// Inbound frames may omit the wire field entirely, in which case they are
/// treated as requests. The dispatcher re-marks routed envelopes as
/// responses before handing them to a handler, so a handler can fill in the
/// payload and emit without rebuilding the envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// Command issued by the UI side.
    #[default]
    Request,
    /// Successful or in-progress reply to a command.
    Response,
    /// Failed reply; the `error` field carries the description.
    Error,
}

/// One message crossing the bus, in either direction.
///
/// The payload is kept as raw JSON: the dispatch core never interprets it,
/// and each handler owns the decode into its command-specific shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Command identifier, matched case-sensitively against the registry.
    pub command: String,
    /// Request/response/error discriminator, `type` on the wire.
    #[serde(rename = "type", default)]
    pub kind: EnvelopeKind,
    /// Opaque payload owned by the handler registered for `command`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
    /// Human-readable failure description; presence signals failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Builds a request envelope carrying the serialized payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unserializable`] if the payload cannot be
    /// serialized.
    pub fn request(
        command: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            command: command.into(),
            kind: EnvelopeKind::Request,
            data: Some(raw_payload(payload)?),
            error: None,
        })
    }

    /// Builds a response envelope, used for unsolicited frames such as
    /// streamed instance data.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unserializable`] if the payload cannot be
    /// serialized.
    pub fn response(
        command: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            command: command.into(),
            kind: EnvelopeKind::Response,
            data: Some(raw_payload(payload)?),
            error: None,
        })
    }

    /// Derives a response to this envelope, echoing its command.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unserializable`] if the payload cannot be
    /// serialized.
    pub fn reply_with(&self, payload: &impl Serialize) -> Result<Self, CodecError> {
        Ok(Self {
            command: self.command.clone(),
            kind: EnvelopeKind::Response,
            data: Some(raw_payload(payload)?),
            error: None,
        })
    }

    /// Derives an error reply to this envelope, echoing its command.
    pub fn reply_error(&self, message: impl Into<String>) -> Self {
        Self {
            command: self.command.clone(),
            kind: EnvelopeKind::Error,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Marks the envelope as a response in progress.
    ///
    /// Applied by the dispatcher on receipt, before the handler runs.
    #[must_use]
    pub fn into_response(mut self) -> Self {
        self.kind = EnvelopeKind::Response;
        self
    }

    /// Parses one wire frame into an envelope.
    ///
    /// Trailing whitespace (including the JSONL newline delimiter) is
    /// trimmed before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] when the frame is empty, is not
    /// valid JSON, or does not match the envelope schema (for example a
    /// non-object top level, or a missing `command` string).
    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let trimmed = trim_trailing_whitespace(raw);
        if trimmed.is_empty() {
            return Err(CodecError::malformed("empty frame"));
        }
        serde_json::from_slice(trimmed).map_err(CodecError::from_json)
    }

    /// Serializes the whole envelope into one wire frame, without the
    /// trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unserializable`] on unserializable content,
    /// which by contract indicates a programming error in the caller.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Unserializable)
    }
}

fn raw_payload(payload: &impl Serialize) -> Result<Box<RawValue>, CodecError> {
    serde_json::value::to_raw_value(payload).map_err(CodecError::Unserializable)
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}
