// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job build pipeline.
//!
//! Stages run in order: workspace setup, source acquisition, module-mode
//! detection, commit resolution, link flags, the target × platform matrix,
//! checkout restore, and the completion check. Stage errors before the
//! matrix are fatal to the job. Inside the matrix a failure only skips its
//! target or cell and is recorded as a [`CellOutcome::Skipped`].

mod artifact;
mod commit;
mod flags;
mod matrix;
mod publish;
mod source;

pub use flags::{BUILD_TIME_VAR, MARKER_VAR};
pub use matrix::target_name;

use std::path::PathBuf;
use std::sync::Arc;

use gox_core::{Clock, Environ, Job, JobError};
use thiserror::Error;

use crate::logger::Logger;
use crate::release::ReleaseRegistry;
use crate::state::SharedState;
use crate::toolchain::{ToolError, Toolchain};
use crate::workspace::WorkspaceRoot;

/// Job-fatal pipeline errors. The display text becomes the job's error.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    InvalidJob(#[from] JobError),

    #[error("failed to create build directory {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get dependencies {package} ({source})")]
    Fetch {
        package: String,
        #[source]
        source: ToolError,
    },

    #[error("failed to find package {0}")]
    PackageNotFound(String),

    #[error("failed to copy package {package}: {source}")]
    Copy {
        package: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load commit: {commitish}: {package} is not a git repo")]
    NotARepository { commitish: String, package: String },

    #[error("failed to load commit {package}: {source}")]
    Checkout {
        package: String,
        #[source]
        source: ToolError,
    },

    #[error("no files compiled")]
    NoFilesCompiled,
}

/// Result of one matrix cell, or of a whole target when a per-target
/// stage (dependency fetch, code generation) failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
    Built { target: String, osarch: String, file: String },
    Skipped { target: String, osarch: Option<String>, reason: String },
}

impl CellOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, CellOutcome::Built { .. })
    }
}

/// Every cell outcome of a job, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub cells: Vec<CellOutcome>,
}

impl BuildReport {
    pub fn built(&self) -> impl Iterator<Item = &CellOutcome> {
        self.cells.iter().filter(|c| c.is_built())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &CellOutcome> {
        self.cells.iter().filter(|c| !c.is_built())
    }
}

/// Toolchain binaries and source locations.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub go_bin: String,
    pub git_bin: String,
    /// Shared GOPATH whose `src/` holds packages for local (non `go get`) builds.
    pub source_root: Option<PathBuf>,
    /// Reported in release notes.
    pub toolchain_version: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            go_bin: "go".to_string(),
            git_bin: "git".to_string(),
            source_root: None,
            toolchain_version: "unknown".to_string(),
        }
    }
}

/// Collaborators shared by every pipeline run.
#[derive(Clone)]
pub struct PipelineDeps {
    pub toolchain: Arc<dyn Toolchain>,
    pub releases: ReleaseRegistry,
    pub state: SharedState,
    pub logger: Logger,
    pub clock: Arc<dyn Clock>,
}

/// Directories and base environment of one job's build.
struct BuildContext {
    job_dir: PathBuf,
    pkg_dir: PathBuf,
    env: Environ,
}

pub struct Pipeline {
    config: PipelineConfig,
    workspace: WorkspaceRoot,
    deps: PipelineDeps,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, workspace: WorkspaceRoot, deps: PipelineDeps) -> Self {
        Self { config, workspace, deps }
    }

    pub fn workspace(&self) -> &WorkspaceRoot {
        &self.workspace
    }

    pub fn deps(&self) -> &PipelineDeps {
        &self.deps
    }

    /// Build every target × platform cell of `job`.
    ///
    /// Artifacts are appended to `job.files` (and published) as they are
    /// produced, so a job-fatal error after the matrix still leaves the
    /// partial manifest in place.
    pub async fn run(&self, job: &mut Job) -> Result<BuildReport, BuildError> {
        job.check_paths()?;
        let logger = &self.deps.logger;
        logger.log(format!("compiling {}...", job.package));
        job.started_at_ms = Some(self.deps.clock.epoch_ms());
        self.deps.state.sync_job(job);

        let mut ctx = self.setup_workspace(job).await?;
        self.acquire_source(job, &ctx).await?;
        let modules = source::detect_module_mode(&ctx.pkg_dir).await;
        ctx.env.set("GO111MODULE", if modules { "on" } else { "off" });
        // Requested overrides win over the workspace defaults, not the platform keys.
        ctx.env.merge(&job.env);

        let commit = self.resolve_commit(job, &ctx).await?;
        let vars = flags::link_variables(job, commit.as_deref(), self.deps.clock.epoch_secs());
        for (k, v) in &vars {
            logger.log(format!("ld-flag-X: {}={}", k, v));
        }
        if job.shrink {
            logger.log("ld-flag: -s -w (shrink)");
        }
        let ldflags = flags::ldflags(job.shrink, &vars);

        let report = self.execute_matrix(job, &ctx, &ldflags).await;
        self.restore_checkout(job, &ctx).await;

        if job.files.is_empty() {
            return Err(BuildError::NoFilesCompiled);
        }
        logger.log(format!("compiled {} ({})", job.package, job.version));
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../pipeline_tests.rs"]
mod tests;
