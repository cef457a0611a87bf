//! Error types for envelope encoding and decoding.

use thiserror::Error;

/// Errors surfaced while converting envelopes to and from their wire form.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Raw frame is not valid JSON or does not match the envelope schema.
    #[error("malformed message: {message}")]
    Malformed {
        /// Description of what made the frame undecodable.
        message: String,
        /// Parser error, when the failure came from serde.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Envelope contents could not be serialized.
    ///
    /// Payloads are serializable by contract, so hitting this variant is a
    /// programming error in the emitting handler rather than a protocol
    /// condition.
    #[error("unserializable envelope content: {0}")]
    Unserializable(#[source] serde_json::Error),
}

impl CodecError {
    /// Creates a malformed-message error with a custom description.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn from_json(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }
}
