//! Command-dispatch daemon bridging a UI client and business handlers.
//!
//! The daemon listens on a configured socket for a UI client and exchanges
//! JSONL-framed envelopes with it. Each inbound frame is decoded, routed by
//! command name through an immutable handler registry, and handed to exactly
//! one handler. Handlers perform their domain work, on the delivery thread
//! or on workers they spawn, and push replies through the [`dispatch::Sender`],
//! the single synchronized funnel onto the outbound side of the bus.
//!
//! ## Protocol
//!
//! The UI sends one request per line:
//!
//! ```json
//! {"command":"runInstance","data":{"name":"probe"}}
//! ```
//!
//! The daemon answers with response or error frames echoing the command,
//! plus any unsolicited frames streamed by long-running work:
//!
//! ```json
//! {"command":"runInstance","type":"response","data":{"id":"inst-1","name":"probe","state":"running"}}
//! {"command":"instanceData","type":"response","data":{"instanceId":"inst-1","sequence":1}}
//! ```
//!
//! Frames that fail to decode and commands with no registered handler are
//! logged and dropped without a reply; the absence of a response is the
//! error signal the protocol exposes to the remote side.

pub mod bootstrap;
pub mod dispatch;
pub mod handlers;
mod health;
mod process;
mod telemetry;
pub mod transport;

pub use bootstrap::{BootstrapError, ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
