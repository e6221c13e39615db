// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace setup and source acquisition.

use std::io;
use std::path::{Path, PathBuf};

use gox_core::{Environ, Job};
use walkdir::WalkDir;

use super::{BuildContext, BuildError, Pipeline};
use crate::toolchain::Invocation;

impl Pipeline {
    pub(super) async fn setup_workspace(&self, job: &Job) -> Result<BuildContext, BuildError> {
        let job_dir = self.workspace.job_dir(&job.id);
        let gopath = self.workspace.gopath(&job.id);
        for dir in [&job_dir, &gopath] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| BuildError::Workspace { path: dir.clone(), source })?;
        }

        let mut env = Environ::new();
        env.set("GOPATH", gopath.to_string_lossy());
        self.deps.logger.log(format!("GOPATH: {}", gopath.display()));

        Ok(BuildContext { job_dir, pkg_dir: self.workspace.package_dir(&job.id, &job.package), env })
    }

    /// Populate the job's GOPATH with the package sources.
    pub(super) async fn acquire_source(&self, job: &Job, ctx: &BuildContext) -> Result<(), BuildError> {
        if job.go_get {
            let inv = Invocation::new(&self.config.go_bin, &ctx.job_dir, ["get", "-v", &job.package])
                .env(ctx.env.clone());
            self.deps
                .toolchain
                .run(&inv, &self.deps.logger)
                .await
                .map_err(|source| BuildError::Fetch { package: job.package.clone(), source })?;
        } else {
            let src = self
                .local_source(&job.package)
                .filter(|p| p.is_dir())
                .ok_or_else(|| BuildError::PackageNotFound(job.package.clone()))?;
            let dst = ctx.pkg_dir.clone();
            let copied = tokio::task::spawn_blocking(move || copy_tree(&src, &dst))
                .await
                .map_err(io::Error::other)
                .and_then(|r| r)
                .map_err(|source| BuildError::Copy { package: job.package.clone(), source })?;
            tracing::debug!(package = %job.package, files = copied, "copied local package");
        }

        if !tokio::fs::try_exists(&ctx.pkg_dir).await.unwrap_or(false) {
            return Err(BuildError::PackageNotFound(job.package.clone()));
        }
        Ok(())
    }

    fn local_source(&self, package: &str) -> Option<PathBuf> {
        let root = self.config.source_root.as_ref()?;
        Some(root.join("src").join(package))
    }
}

/// Whether the package builds in module mode (has a `go.mod`).
pub(super) async fn detect_module_mode(pkg_dir: &Path) -> bool {
    tokio::fs::try_exists(pkg_dir.join("go.mod")).await.unwrap_or(false)
}

/// Recursively copy `src` into `dst`, returning the number of files copied.
pub(super) fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut files = 0;
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}
