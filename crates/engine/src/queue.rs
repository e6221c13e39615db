// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job admission.
//!
//! Requests are validated, numbered, and pushed onto a bounded channel read
//! by the single [`BuildWorker`](crate::worker::BuildWorker). Admission never
//! waits for space: a full queue rejects the job immediately.

use std::sync::Arc;

use gox_core::{IdGen, Job, JobError, JobId};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::logger::Logger;
use crate::state::SharedState;

/// Jobs that may wait behind the running build.
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Invalid(#[from] JobError),

    #[error("queue is full")]
    QueueFull,

    #[error("build worker has stopped")]
    Closed,
}

/// Producer side of the build queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
    state: SharedState,
    ids: Arc<dyn IdGen>,
    logger: Logger,
}

impl JobQueue {
    /// Create the queue and the receiver handed to the worker.
    pub fn new(
        capacity: usize,
        state: SharedState,
        ids: Arc<dyn IdGen>,
        logger: Logger,
    ) -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, state, ids, logger }, rx)
    }

    /// Validate and enqueue a job, returning its assigned ID.
    pub fn submit(&self, mut job: Job) -> Result<JobId, AdmissionError> {
        job.validate()?;

        // Reserve first so a rejected job never bumps the counters.
        let permit = self.tx.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => AdmissionError::QueueFull,
            TrySendError::Closed(()) => AdmissionError::Closed,
        })?;

        let (id, number) = self.state.mutate(|s| {
            s.num_total += 1;
            (self.ids.next(), s.num_total)
        });
        job.prepare(id.clone());
        tracing::info!(job_id = %id, package = %job.package, number, "job admitted");
        self.logger.log(format!("enqueue compilation ({} #{})", id, number));

        permit.send(job);
        // Read the channel under the state lock so a concurrent dequeue
        // cannot be overwritten by a stale count.
        self.state.update(|s| s.num_queued = self.pending());
        Ok(id)
    }

    /// Jobs waiting in the channel, excluding the one being built.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
