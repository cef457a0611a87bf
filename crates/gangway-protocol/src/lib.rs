//! Wire protocol shared by the gangway daemon and its UI clients.
//!
//! Every message crossing the bus is one [`Envelope`] serialized as a single
//! JSONL line. The envelope carries a command name, an opaque payload that
//! only the handler registered for that command may interpret, a
//! request/response/error discriminator, and an optional human-readable
//! error description.
//!
//! This crate is purely transforming: it owns the codec and the envelope
//! derivation helpers, and performs no I/O.

mod envelope;
mod errors;

pub use envelope::{Envelope, EnvelopeKind};
pub use errors::CodecError;
