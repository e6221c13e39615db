// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single build worker.

use gox_core::Job;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::pipeline::Pipeline;

/// Serial consumer of the build queue. At most one pipeline runs at a time.
pub struct BuildWorker {
    rx: mpsc::Receiver<Job>,
    pipeline: Pipeline,
}

impl BuildWorker {
    pub fn new(rx: mpsc::Receiver<Job>, pipeline: Pipeline) -> Self {
        Self { rx, pipeline }
    }

    /// Build jobs until every queue sender is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            self.process(job).await;
        }
        tracing::info!("build queue closed, worker exiting");
    }

    /// Run one job through the pipeline and record its outcome.
    pub async fn process(&self, mut job: Job) -> Job {
        let deps = self.pipeline.deps();
        job.queued = false;
        deps.state.update(|s| {
            s.jobs.insert(0, job.clone());
            s.ready = false;
            s.num_queued = self.rx.len();
        });

        let span = tracing::info_span!("build", job_id = %job.id, package = %job.package);
        match self.pipeline.run(&mut job).instrument(span).await {
            Ok(report) => {
                tracing::info!(
                    job_id = %job.id,
                    built = report.built().count(),
                    skipped = report.skipped().count(),
                    "build finished"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "build failed");
                deps.logger.log(format!("compile error '{}': {}", job.package, e));
                job.error = e.to_string();
            }
        }

        job.completed_at_ms = Some(deps.clock.epoch_ms());
        job.completed = true;
        deps.state.update(|s| {
            s.replace_job(&job);
            s.ready = true;
            s.num_done += 1;
        });
        tracing::info!(job_id = %job.id, phase = %job.phase(), files = job.files.len(), "job completed");
        job
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
