//! Environment management: named parameter sets the UI can create, list,
//! and delete.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{CommandHandler, FnHandler};

use super::{HandlerContext, decode_request, respond};

/// One named environment: a target the UI runs instances against,
/// described entirely by a free-form string parameter map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name chosen by the user.
    pub name: String,
    /// Connection parameters, interpreted by whichever runtime uses them.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Domain failures reported by the environment store.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// No environment with the given identifier.
    #[error("unknown environment: {id}")]
    Unknown {
        /// Identifier that failed to resolve.
        id: String,
    },
    /// Environment name was empty or whitespace.
    #[error("environment name must not be empty")]
    EmptyName,
}

/// In-memory environment store.
///
/// The daemon holds environments for the lifetime of the process only;
/// persisting them is the surrounding application's concern.
#[derive(Default)]
pub struct EnvironmentStore {
    entries: Mutex<BTreeMap<String, Environment>>,
    next_id: AtomicU64,
}

impl EnvironmentStore {
    /// Creates an environment and assigns it an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::EmptyName`] for a blank name.
    pub fn create(
        &self,
        name: &str,
        params: BTreeMap<String, String>,
    ) -> Result<Environment, EnvironmentError> {
        if name.trim().is_empty() {
            return Err(EnvironmentError::EmptyName);
        }
        let id = format!("env-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let environment = Environment {
            id: id.clone(),
            name: name.to_owned(),
            params,
        };
        self.lock().insert(id, environment.clone());
        Ok(environment)
    }

    /// Removes an environment, returning the removed entry.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::Unknown`] when the identifier does not
    /// resolve.
    pub fn delete(&self, id: &str) -> Result<Environment, EnvironmentError> {
        self.lock()
            .remove(id)
            .ok_or_else(|| EnvironmentError::Unknown { id: id.to_owned() })
    }

    /// All environments, ordered by identifier.
    #[must_use]
    pub fn list(&self) -> Vec<Environment> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Environment>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEnvironmentRequest {
    name: String,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEnvironmentRequest {
    id: String,
}

#[derive(Debug, Serialize)]
struct EnvironmentListResponse {
    environments: Vec<Environment>,
}

/// `createEnvironment`: stores a new environment and echoes it back.
pub(crate) fn create(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let store = context.environments();
    FnHandler::boxed("createEnvironment", move |envelope| {
        let request: CreateEnvironmentRequest = match decode_request(&envelope) {
            Ok(request) => request,
            Err(error) => {
                sender.emit(envelope.reply_error(format!("invalid createEnvironment request: {error}")));
                return;
            }
        };
        match store.create(&request.name, request.params) {
            Ok(environment) => respond(&sender, &envelope, &environment),
            Err(error) => sender.emit(envelope.reply_error(error.to_string())),
        }
    })
}

/// `deleteEnvironment`: removes an environment by identifier.
pub(crate) fn delete(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let store = context.environments();
    FnHandler::boxed("deleteEnvironment", move |envelope| {
        let request: DeleteEnvironmentRequest = match decode_request(&envelope) {
            Ok(request) => request,
            Err(error) => {
                sender.emit(envelope.reply_error(format!("invalid deleteEnvironment request: {error}")));
                return;
            }
        };
        match store.delete(&request.id) {
            Ok(environment) => respond(&sender, &envelope, &environment),
            Err(error) => sender.emit(envelope.reply_error(error.to_string())),
        }
    })
}

/// `listEnvironments`: returns every stored environment.
pub(crate) fn list(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let store = context.environments();
    FnHandler::boxed("listEnvironments", move |envelope| {
        let payload = EnvironmentListResponse {
            environments: store.list(),
        };
        respond(&sender, &envelope, &payload);
    })
}
