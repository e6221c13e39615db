// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compilation job record.
//!
//! A job is created from a request, normalized at admission, then owned by
//! the build worker. Only the pipeline-written fields (`files`, `error`,
//! timestamps, `queued`, `completed`) change after admission.

use crate::id::JobId;
use crate::platform::{flatten_platforms, OsArch, Platforms};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_VERSION_VAR: &str = "main.VERSION";
pub const DEFAULT_COMMIT_VAR: &str = "main.COMMIT";
pub const DEFAULT_LABEL_VAR: &str = "main.LABEL";

/// Target path meaning "the package root".
pub const ROOT_TARGET: &str = ".";

/// Reasons a job description is rejected before queueing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("missing package")]
    MissingPackage,

    #[error("missing version")]
    MissingVersion,

    #[error("requires at least one OS/Arch")]
    NoPlatforms,

    #[error("invalid OS/Arch '{0}' (expected os/arch)")]
    InvalidPlatform(String),

    #[error("invalid package path '{0}'")]
    InvalidPackage(String),

    #[error("invalid target path '{0}'")]
    InvalidTarget(String),
}

/// Lifecycle position of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Queued,
    Running,
    Succeeded,
    Failed,
}

crate::simple_display! {
    JobPhase {
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// A cross-compilation request and its outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    // server-assigned
    pub id: JobId,
    pub queued: bool,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// Registered release host to publish to. Set in-process only.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub releaser: Option<String>,
    pub osarch: Vec<String>,
    /// Output manifest: compressed artifact names in build order.
    pub files: Vec<String>,

    // source
    #[serde(alias = "name")]
    pub package: String,
    pub commitish: String,
    pub commit_var: String,
    pub label_var: String,
    pub label: String,

    // compile options
    pub cgo: bool,
    /// Strip debug symbols (`-s -w`).
    pub shrink: bool,
    /// Fetch the package remotely instead of copying it from the source root.
    pub go_get: bool,
    pub go_generate: bool,
    pub tags: String,
    pub version: String,
    pub version_var: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Platforms>,
    pub targets: Vec<String>,
    pub variables: HashMap<String, String>,
    pub env: HashMap<String, String>,
}

impl Job {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self { package: package.into(), version: version.into(), ..Self::default() }
    }

    /// Validate the request and flatten its platform matrix.
    ///
    /// A supplied `platforms` matrix replaces any flat `osarch` list.
    pub fn validate(&mut self) -> Result<(), JobError> {
        if self.package.is_empty() {
            return Err(JobError::MissingPackage);
        }
        if self.version.is_empty() {
            return Err(JobError::MissingVersion);
        }
        if let Some(platforms) = &self.platforms {
            self.osarch = flatten_platforms(platforms);
        }
        if self.osarch.is_empty() {
            return Err(JobError::NoPlatforms);
        }
        if let Some(bad) = self.osarch.iter().find(|s| OsArch::parse(s).is_none()) {
            return Err(JobError::InvalidPlatform(bad.clone()));
        }
        self.check_paths()
    }

    /// Reject package and target paths that would resolve outside the job's
    /// GOPATH: absolute paths and any `..` component.
    pub fn check_paths(&self) -> Result<(), JobError> {
        if !is_confined(&self.package) {
            return Err(JobError::InvalidPackage(self.package.clone()));
        }
        if let Some(bad) = self.targets.iter().find(|t| !is_confined(t)) {
            return Err(JobError::InvalidTarget(bad.clone()));
        }
        Ok(())
    }

    /// Fill defaults and stamp identity for a job that passed admission.
    pub fn prepare(&mut self, id: JobId) {
        if self.version_var.is_empty() {
            self.version_var = DEFAULT_VERSION_VAR.to_string();
        }
        if self.commit_var.is_empty() {
            self.commit_var = DEFAULT_COMMIT_VAR.to_string();
        }
        if self.label_var.is_empty() {
            self.label_var = DEFAULT_LABEL_VAR.to_string();
        }
        self.variables.insert(self.version_var.clone(), self.version.clone());
        self.id = id;
        if self.targets.is_empty() {
            self.targets = vec![ROOT_TARGET.to_string()];
        }
        self.queued = true;
        self.completed = false;
        self.error.clear();
    }

    /// Parsed platform pairs. Entries that fail to parse are skipped; admitted
    /// jobs never contain any.
    pub fn platform_pairs(&self) -> Vec<OsArch> {
        self.osarch.iter().filter_map(|s| OsArch::parse(s)).collect()
    }

    pub fn phase(&self) -> JobPhase {
        if self.completed {
            if self.error.is_empty() {
                JobPhase::Succeeded
            } else {
                JobPhase::Failed
            }
        } else if self.queued {
            JobPhase::Queued
        } else {
            JobPhase::Running
        }
    }
}

fn is_confined(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return false;
    }
    !path.split(['/', '\\']).any(|part| part == "..")
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
