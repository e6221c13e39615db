// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build workspace root.
//!
//! One directory per job under a root owned by the orchestrator:
//!
//! ```text
//! <root>/<job id>/                          artifacts (*.gz)
//! <root>/<job id>/gopath/                   isolated GOPATH
//! <root>/<job id>/gopath/src/<package>/     package sources
//! ```

use std::io;
use std::path::{Path, PathBuf};

use gox_core::JobId;

/// Name of the per-job dependency root.
const GOPATH_DIR: &str = "gopath";

#[derive(Debug, Clone)]
pub struct WorkspaceRoot {
    path: PathBuf,
}

impl WorkspaceRoot {
    /// Wrap an existing directory without touching it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Clear leftovers from a previous run and create the root.
    pub fn prepare(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn job_dir(&self, id: &JobId) -> PathBuf {
        self.path.join(id.as_str())
    }

    pub fn gopath(&self, id: &JobId) -> PathBuf {
        self.job_dir(id).join(GOPATH_DIR)
    }

    pub fn package_dir(&self, id: &JobId, package: &str) -> PathBuf {
        self.gopath(id).join("src").join(package)
    }

    /// Path of a finished artifact, if both `id` and `name` are plain file
    /// names.
    pub fn artifact(&self, id: &JobId, name: &str) -> Option<PathBuf> {
        if !is_plain_name(id.as_str()) || !is_plain_name(name) {
            return None;
        }
        Some(self.job_dir(id).join(name))
    }
}

fn is_plain_name(name: &str) -> bool {
    Path::new(name).file_name().is_some_and(|f| f == name)
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
