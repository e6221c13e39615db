// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server state and snapshot publication.
//!
//! All reads and writes go through one mutex. [`SharedState::update`] mutates
//! under the lock, clones a snapshot, releases the lock, and only then hands
//! the snapshot to the publisher, so a slow observer can never stall a
//! producer that wants the lock.

use std::sync::Arc;

use gox_core::{Job, JobId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::log_buffer::LogBuffer;

/// Observable state pushed to subscribers on every milestone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    /// False while a build is running.
    pub ready: bool,
    pub num_queued: usize,
    pub num_done: u64,
    pub num_total: u64,
    /// Job history, newest first.
    pub jobs: Vec<Job>,
    #[serde(flatten)]
    pub log: LogBuffer,
}

impl ServerState {
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self { log: LogBuffer::with_capacity(capacity), ..Self::default() }
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    /// Overwrite the history entry with the same ID. No-op if absent.
    pub fn replace_job(&mut self, job: &Job) {
        if let Some(slot) = self.jobs.iter_mut().find(|j| j.id == job.id) {
            *slot = job.clone();
        }
    }
}

/// Opaque "push this snapshot to observers" primitive.
pub trait StatePublisher: Send + Sync + 'static {
    fn publish(&self, snapshot: Arc<ServerState>);
}

/// Publisher backed by a `watch` channel: subscribers always see the latest
/// snapshot and never hold up the sender.
pub struct WatchPublisher {
    tx: watch::Sender<Arc<ServerState>>,
}

impl WatchPublisher {
    pub fn new(initial: ServerState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ServerState>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Arc<ServerState> {
        self.tx.borrow().clone()
    }
}

impl StatePublisher for WatchPublisher {
    fn publish(&self, snapshot: Arc<ServerState>) {
        self.tx.send_replace(snapshot);
    }
}

/// Handle to the process-wide server state.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<ServerState>>,
    publisher: Arc<dyn StatePublisher>,
}

impl SharedState {
    pub fn new(initial: ServerState, publisher: Arc<dyn StatePublisher>) -> Self {
        Self { inner: Arc::new(Mutex::new(initial)), publisher }
    }

    /// Mutate under the lock, then publish a snapshot after releasing it.
    pub fn update<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.inner.lock();
            let result = f(&mut state);
            (result, Arc::new(state.clone()))
        };
        self.publisher.publish(snapshot);
        result
    }

    /// Mutate under the lock without publishing. A later `update` or
    /// `publish` carries the change to observers.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn snapshot(&self) -> ServerState {
        self.inner.lock().clone()
    }

    /// Publish the current state without changing it.
    pub fn publish(&self) {
        let snapshot = Arc::new(self.snapshot());
        self.publisher.publish(snapshot);
    }

    /// Copy a job's current fields into history and publish.
    pub fn sync_job(&self, job: &Job) {
        self.update(|s| s.replace_job(job));
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> Arc<Mutex<ServerState>> {
        Arc::clone(&self.inner)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
