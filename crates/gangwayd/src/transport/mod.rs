//! Socket transport for the daemon bus.
//!
//! The listener binds the configured endpoint and accepts one UI client at
//! a time. Each accepted connection is split in two: its write half is
//! attached to the shared [`ClientSlot`] that the outbound sink pushes
//! frames through, and its read half is drained on a dedicated thread that
//! delivers JSONL frames, in arrival order, to the [`InboundHandler`] seam.
//!
//! The transport makes no delivery promises: frames pushed while no client
//! is attached are dropped, and a newly accepted connection supersedes the
//! previous one.

mod connection;
mod errors;
mod listener;
mod sink;

pub use self::connection::InboundHandler;
pub(crate) use self::connection::ConnectionStream;
pub use self::errors::ListenerError;
pub use self::listener::{BusListener, ListenerHandle};
pub use self::sink::{BusSink, ClientSink, ClientSlot, SinkError};

pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
