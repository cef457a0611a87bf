//! Reference command handlers wired into the daemon at bootstrap.
//!
//! Handlers live behind the dispatch boundary: each one decodes its own
//! typed request from the opaque envelope payload, performs its domain
//! work, and pushes replies through the injected [`Sender`]. The dispatch
//! core knows them only as `(command, handle)` pairs.
//!
//! [`builtin_handlers`] is the declarative, ordered registration list: the
//! daemon's whole command configuration surface.

pub mod environments;
pub mod instances;
pub mod session;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use gangway_protocol::Envelope;

use crate::dispatch::{CommandHandler, Sender};

use self::environments::EnvironmentStore;
use self::instances::InstanceManager;

pub(crate) const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// Shared collaborators injected into every handler at wiring time.
///
/// The sender is constructed before the context, so no handler can exist
/// without an emission path already attached.
pub struct HandlerContext {
    sender: Arc<Sender>,
    environments: Arc<EnvironmentStore>,
    instances: Arc<InstanceManager>,
}

impl HandlerContext {
    /// Builds the context and the domain services behind it.
    #[must_use]
    pub fn new(sender: Arc<Sender>) -> Self {
        let instances = Arc::new(InstanceManager::new(Arc::clone(&sender)));
        Self {
            sender,
            environments: Arc::new(EnvironmentStore::default()),
            instances,
        }
    }

    pub(crate) fn sender(&self) -> Arc<Sender> {
        Arc::clone(&self.sender)
    }

    pub(crate) fn environments(&self) -> Arc<EnvironmentStore> {
        Arc::clone(&self.environments)
    }

    pub(crate) fn instances(&self) -> Arc<InstanceManager> {
        Arc::clone(&self.instances)
    }
}

/// Builds the ordered handler list registered at bootstrap.
#[must_use]
pub fn builtin_handlers(context: &HandlerContext) -> Vec<Box<dyn CommandHandler>> {
    vec![
        session::helo(context),
        environments::create(context),
        environments::delete(context),
        environments::list(context),
        instances::run(context),
        instances::stop(context),
        instances::remove(context),
        instances::list(context),
    ]
}

/// Decodes a handler's typed request from the envelope payload.
///
/// An absent or null payload decodes as an empty object, so requests whose
/// fields all have defaults accept bare commands.
pub(crate) fn decode_request<T: DeserializeOwned>(
    envelope: &Envelope,
) -> Result<T, serde_json::Error> {
    let raw = envelope.data.as_deref().map_or("{}", RawValue::get);
    let raw = if raw == "null" { "{}" } else { raw };
    serde_json::from_str(raw)
}

/// Replies to the envelope with a serialized payload, degrading to an error
/// frame if the payload refuses to serialize.
pub(crate) fn respond<T: Serialize>(sender: &Sender, envelope: &Envelope, payload: &T) {
    match envelope.reply_with(payload) {
        Ok(reply) => sender.emit(reply),
        Err(error) => sender.emit(envelope.reply_error(error.to_string())),
    }
}
