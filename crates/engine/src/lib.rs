// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gox-engine: build queue, worker, pipeline and shared state.

pub mod log_buffer;
pub mod logger;
pub mod orchestrator;
pub mod pipeline;
pub mod queue;
pub mod release;
pub mod state;
pub mod toolchain;
pub mod worker;
pub mod workspace;

pub use log_buffer::{LogBuffer, MAX_LOG_SIZE};
pub use logger::{LogDrain, Logger};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorDeps, OrchestratorError};
pub use pipeline::{BuildError, BuildReport, CellOutcome, Pipeline, PipelineConfig, PipelineDeps};
pub use queue::{AdmissionError, JobQueue, DEFAULT_QUEUE_CAPACITY};
pub use release::{release_notes, DirectoryReleaseHost, Release, ReleaseError, ReleaseHost, ReleaseRegistry};
#[cfg(any(test, feature = "test-support"))]
pub use release::FakeReleaseHost;
pub use state::{ServerState, SharedState, StatePublisher, WatchPublisher};
#[cfg(any(test, feature = "test-support"))]
pub use toolchain::{FakeToolchain, FAKE_BINARY, FAKE_COMMIT};
pub use toolchain::{Invocation, ProcessToolchain, ToolError, Toolchain};
pub use worker::BuildWorker;
pub use workspace::WorkspaceRoot;
