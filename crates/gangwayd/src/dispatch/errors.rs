//! Error types for routing and emission failures.
//!
//! Every variant is terminal for the single message it concerns and never
//! fatal to the daemon: the dispatch loop keeps serving subsequent frames,
//! and the sender drops the frame it could not deliver.

use thiserror::Error;

use gangway_protocol::CodecError;

use crate::transport::SinkError;

/// Failures while decoding and routing one inbound frame.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Frame could not be decoded into an envelope.
    #[error("malformed message: {source}")]
    MalformedMessage {
        /// Codec failure describing the undecodable frame.
        #[source]
        source: CodecError,
    },

    /// Envelope decoded but carries an empty command name.
    #[error("message carries an empty command")]
    EmptyCommand,

    /// No handler is registered for the command.
    #[error("unknown command: {command}")]
    UnknownCommand {
        /// Command name that failed to resolve.
        command: String,
    },
}

/// Failures while emitting one outbound frame.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Envelope could not be encoded; by contract a programming error in
    /// the emitting handler.
    #[error("failed to encode outbound envelope: {0}")]
    Encode(#[source] CodecError),

    /// The transport refused the frame.
    #[error(transparent)]
    Sink(#[from] SinkError),
}
