//! Command dispatch: routing inbound envelopes to registered handlers.
//!
//! The dispatcher is the inbound end of the core. It decodes each raw frame
//! delivered by the transport, re-marks the envelope as a response in
//! progress, resolves the command against the immutable
//! [`HandlerRegistry`], and invokes exactly one [`CommandHandler`]
//! synchronously on the delivery thread. Undecodable frames and unknown
//! commands are logged and dropped without a reply: silence is the failure
//! signal this protocol exposes, and the dispatcher never synthesizes an
//! error frame on a handler's behalf.
//!
//! The [`Sender`] is the outbound end: a process-wide funnel that encodes
//! and pushes one frame at a time under a single mutex. Handlers may defer
//! work to their own threads and emit later; the lock is the only
//! serialization point, so concurrently finishing handlers produce whole,
//! non-interleaved frames in lock-acquisition order.

mod dispatcher;
mod errors;
mod handler;
mod registry;
mod sender;

pub use self::dispatcher::Dispatcher;
pub use self::errors::{DispatchError, EmitError};
pub use self::handler::{CommandHandler, FnHandler};
pub use self::registry::{HandlerRegistry, RegistryError};
pub use self::sender::Sender;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
