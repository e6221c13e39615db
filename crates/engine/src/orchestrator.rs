// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the queue, worker, log drain and state publisher together.

use std::path::PathBuf;
use std::sync::Arc;

use gox_core::{Clock, IdGen, Job, JobId, RandomIdGen, SystemClock};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::log_buffer::MAX_LOG_SIZE;
use crate::logger::{LogDrain, Logger};
use crate::pipeline::{Pipeline, PipelineConfig, PipelineDeps};
use crate::queue::{AdmissionError, JobQueue, DEFAULT_QUEUE_CAPACITY};
use crate::release::ReleaseRegistry;
use crate::state::{ServerState, SharedState, WatchPublisher};
use crate::toolchain::{ProcessToolchain, Toolchain};
use crate::worker::BuildWorker;
use crate::workspace::WorkspaceRoot;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to prepare build directory {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Static settings for one orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Cleared and recreated on start. Holds one directory per job.
    pub build_dir: PathBuf,
    pub source_root: Option<PathBuf>,
    pub go_bin: String,
    pub git_bin: String,
    pub toolchain_version: String,
    pub queue_capacity: usize,
    pub log_capacity: usize,
}

impl OrchestratorConfig {
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            build_dir: build_dir.into(),
            source_root: pipeline.source_root,
            go_bin: pipeline.go_bin,
            git_bin: pipeline.git_bin,
            toolchain_version: pipeline.toolchain_version,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_capacity: MAX_LOG_SIZE,
        }
    }

    fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            go_bin: self.go_bin.clone(),
            git_bin: self.git_bin.clone(),
            source_root: self.source_root.clone(),
            toolchain_version: self.toolchain_version.clone(),
        }
    }
}

/// Replaceable collaborators.
pub struct OrchestratorDeps {
    pub toolchain: Arc<dyn Toolchain>,
    pub releases: ReleaseRegistry,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGen>,
}

impl OrchestratorDeps {
    /// Real processes, wall clock, random IDs.
    pub fn system(releases: ReleaseRegistry) -> Self {
        Self {
            toolchain: Arc::new(ProcessToolchain),
            releases,
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIdGen),
        }
    }
}

/// Handle to a running build service.
pub struct Orchestrator {
    queue: JobQueue,
    state: SharedState,
    publisher: Arc<WatchPublisher>,
    logger: Logger,
    workspace: WorkspaceRoot,
    worker: JoinHandle<()>,
    drain: JoinHandle<()>,
}

impl Orchestrator {
    /// Prepare the build directory, start the log drain, authenticate
    /// release hosts, and start the worker.
    pub async fn start(config: OrchestratorConfig, deps: OrchestratorDeps) -> Result<Self, OrchestratorError> {
        let workspace = WorkspaceRoot::prepare(&config.build_dir)
            .map_err(|source| OrchestratorError::Workspace { path: config.build_dir.clone(), source })?;

        let initial = ServerState::with_log_capacity(config.log_capacity);
        let publisher = Arc::new(WatchPublisher::new(initial.clone()));
        let state = SharedState::new(initial, publisher.clone());

        let (logger, log_rx) = Logger::channel();
        let drain = tokio::spawn(LogDrain::new(log_rx, state.clone(), Arc::clone(&deps.clock)).run());
        logger.log("gox started");
        deps.releases.authenticate_all(&logger).await;

        let (queue, rx) = JobQueue::new(config.queue_capacity, state.clone(), deps.ids, logger.clone());
        let pipeline = Pipeline::new(
            config.pipeline(),
            workspace.clone(),
            PipelineDeps {
                toolchain: deps.toolchain,
                releases: deps.releases,
                state: state.clone(),
                logger: logger.clone(),
                clock: deps.clock,
            },
        );

        state.update(|s| s.ready = true);
        let worker = tokio::spawn(BuildWorker::new(rx, pipeline).run());
        tracing::info!(
            build_dir = %workspace.path().display(),
            queue_capacity = queue.capacity(),
            "orchestrator started"
        );

        Ok(Self { queue, state, publisher, logger, workspace, worker, drain })
    }

    pub fn submit(&self, job: Job) -> Result<JobId, AdmissionError> {
        self.queue.submit(job)
    }

    pub fn snapshot(&self) -> ServerState {
        self.state.snapshot()
    }

    /// Receiver that always holds the most recently published state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ServerState>> {
        self.publisher.subscribe()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn workspace(&self) -> &WorkspaceRoot {
        &self.workspace
    }

    /// Stop accepting jobs, let the running build finish, then flush the log.
    pub async fn shutdown(self) {
        let Self { queue, logger, worker, drain, .. } = self;
        drop(queue);
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "build worker ended abnormally");
        }
        drop(logger);
        if let Err(e) = drain.await {
            tracing::warn!(error = %e, "log drain ended abnormally");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
