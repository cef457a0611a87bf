//! Long-running instance lifecycle.
//!
//! An instance is a unit of streaming domain work: once started it runs on
//! its own worker thread and pushes `instanceData` frames through the
//! sender until it is told to stop, then announces `instanceStopped`. This
//! is the deferred-emit path of the bus: frames leave from worker threads,
//! not from the dispatch thread that started the instance.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use gangway_protocol::Envelope;

use crate::dispatch::{CommandHandler, FnHandler, Sender};

use super::{HANDLER_TARGET, HandlerContext, decode_request, respond};

/// Lifecycle state of a managed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    /// Worker thread is streaming data frames.
    Running,
    /// Worker has been told to stop; the record remains until removed.
    Stopped,
}

/// Descriptor of one managed instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    /// Manager-assigned identifier.
    pub id: String,
    /// Display name chosen by the user.
    pub name: String,
    /// Current lifecycle state.
    pub state: InstanceState,
    /// Milliseconds between streamed data frames.
    pub interval_ms: u64,
}

/// Domain failures reported by the instance manager.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// No instance with the given identifier.
    #[error("unknown instance: {id}")]
    Unknown {
        /// Identifier that failed to resolve.
        id: String,
    },
    /// Instance name was empty or whitespace.
    #[error("instance name must not be empty")]
    EmptyName,
    /// Spawning the worker thread failed.
    #[error("failed to start instance worker: {source}")]
    Spawn {
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },
}

struct InstanceEntry {
    record: InstanceRecord,
    stop: Option<mpsc::Sender<()>>,
}

/// Owns instance records and their worker threads.
///
/// Workers are detached: stopping an instance signals its worker and
/// returns immediately rather than joining on the dispatch path, so the
/// `instanceStopped` frame arrives whenever the worker next wakes.
pub struct InstanceManager {
    sender: Arc<Sender>,
    entries: Mutex<BTreeMap<String, InstanceEntry>>,
    next_id: AtomicU64,
}

impl InstanceManager {
    /// Creates a manager emitting through the given sender.
    #[must_use]
    pub fn new(sender: Arc<Sender>) -> Self {
        Self {
            sender,
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Starts an instance streaming at the given interval.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::EmptyName`] for a blank name and
    /// [`InstanceError::Spawn`] when the worker thread cannot start.
    pub fn run(&self, name: &str, interval: Duration) -> Result<InstanceRecord, InstanceError> {
        if name.trim().is_empty() {
            return Err(InstanceError::EmptyName);
        }
        let id = format!("inst-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (stop_tx, stop_rx) = mpsc::channel();

        let sender = Arc::clone(&self.sender);
        let worker_id = id.clone();
        thread::Builder::new()
            .name(format!("instance-{id}"))
            .spawn(move || run_worker(&sender, &worker_id, interval, &stop_rx))
            .map_err(|source| InstanceError::Spawn { source })?;

        let record = InstanceRecord {
            id: id.clone(),
            name: name.to_owned(),
            state: InstanceState::Running,
            interval_ms: interval.as_millis() as u64,
        };
        self.lock().insert(
            id,
            InstanceEntry {
                record: record.clone(),
                stop: Some(stop_tx),
            },
        );
        Ok(record)
    }

    /// Signals an instance's worker to stop and marks the record stopped.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::Unknown`] when the identifier does not
    /// resolve. Stopping an already stopped instance is a no-op.
    pub fn stop(&self, id: &str) -> Result<InstanceRecord, InstanceError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| InstanceError::Unknown { id: id.to_owned() })?;
        if let Some(stop) = entry.stop.take() {
            // The worker may already have exited; a dead channel is fine.
            let _ = stop.send(());
        }
        entry.record.state = InstanceState::Stopped;
        Ok(entry.record.clone())
    }

    /// Removes an instance record, stopping its worker if still running.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::Unknown`] when the identifier does not
    /// resolve.
    pub fn remove(&self, id: &str) -> Result<InstanceRecord, InstanceError> {
        let mut entry = self
            .lock()
            .remove(id)
            .ok_or_else(|| InstanceError::Unknown { id: id.to_owned() })?;
        if let Some(stop) = entry.stop.take() {
            let _ = stop.send(());
        }
        entry.record.state = InstanceState::Stopped;
        Ok(entry.record)
    }

    /// All instance records, ordered by identifier.
    #[must_use]
    pub fn list(&self) -> Vec<InstanceRecord> {
        self.lock()
            .values()
            .map(|entry| entry.record.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, InstanceEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceDataFrame<'a> {
    instance_id: &'a str,
    sequence: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceStoppedFrame<'a> {
    instance_id: &'a str,
}

fn run_worker(sender: &Sender, id: &str, interval: Duration, stop: &mpsc::Receiver<()>) {
    let mut sequence = 0_u64;
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                sequence += 1;
                emit_stream_frame(
                    sender,
                    "instanceData",
                    &InstanceDataFrame {
                        instance_id: id,
                        sequence,
                    },
                );
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    emit_stream_frame(sender, "instanceStopped", &InstanceStoppedFrame { instance_id: id });
}

fn emit_stream_frame<T: Serialize>(sender: &Sender, command: &str, payload: &T) {
    match Envelope::response(command, payload) {
        Ok(frame) => sender.emit(frame),
        Err(error) => {
            warn!(target: HANDLER_TARGET, %error, command, "failed to build stream frame");
        }
    }
}

fn default_interval_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunInstanceRequest {
    name: String,
    #[serde(default = "default_interval_ms")]
    interval_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceIdRequest {
    id: String,
}

#[derive(Debug, Serialize)]
struct InstanceListResponse {
    instances: Vec<InstanceRecord>,
}

/// `runInstance`: starts a streaming instance and replies with its record.
pub(crate) fn run(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let manager = context.instances();
    FnHandler::boxed("runInstance", move |envelope| {
        let request: RunInstanceRequest = match decode_request(&envelope) {
            Ok(request) => request,
            Err(error) => {
                sender.emit(envelope.reply_error(format!("invalid runInstance request: {error}")));
                return;
            }
        };
        match manager.run(&request.name, Duration::from_millis(request.interval_ms)) {
            Ok(record) => respond(&sender, &envelope, &record),
            Err(error) => sender.emit(envelope.reply_error(error.to_string())),
        }
    })
}

/// `stopInstance`: signals an instance to stop streaming.
pub(crate) fn stop(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let manager = context.instances();
    FnHandler::boxed("stopInstance", move |envelope| {
        let request: InstanceIdRequest = match decode_request(&envelope) {
            Ok(request) => request,
            Err(error) => {
                sender.emit(envelope.reply_error(format!("invalid stopInstance request: {error}")));
                return;
            }
        };
        match manager.stop(&request.id) {
            Ok(record) => respond(&sender, &envelope, &record),
            Err(error) => sender.emit(envelope.reply_error(error.to_string())),
        }
    })
}

/// `removeInstance`: drops an instance record, stopping it first if needed.
pub(crate) fn remove(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let manager = context.instances();
    FnHandler::boxed("removeInstance", move |envelope| {
        let request: InstanceIdRequest = match decode_request(&envelope) {
            Ok(request) => request,
            Err(error) => {
                sender.emit(envelope.reply_error(format!("invalid removeInstance request: {error}")));
                return;
            }
        };
        match manager.remove(&request.id) {
            Ok(record) => respond(&sender, &envelope, &record),
            Err(error) => sender.emit(envelope.reply_error(error.to_string())),
        }
    })
}

/// `listInstances`: returns every instance record.
pub(crate) fn list(context: &HandlerContext) -> Box<dyn CommandHandler> {
    let sender = context.sender();
    let manager = context.instances();
    FnHandler::boxed("listInstances", move |envelope| {
        let payload = InstanceListResponse {
            instances: manager.list(),
        };
        respond(&sender, &envelope, &payload);
    })
}
