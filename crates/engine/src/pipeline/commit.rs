// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Revision selection and restore.

use gox_core::Job;

use super::{BuildContext, BuildError, Pipeline};
use crate::toolchain::Invocation;

impl Pipeline {
    /// Check out the requested revision, or discover the current one.
    ///
    /// Returns the value to inject under the job's commit variable. A failed
    /// discovery is not an error; the variable is then left unset.
    pub(super) async fn resolve_commit(
        &self,
        job: &Job,
        ctx: &BuildContext,
    ) -> Result<Option<String>, BuildError> {
        let logger = &self.deps.logger;
        let git = |args: &[&str]| Invocation::new(&self.config.git_bin, &ctx.pkg_dir, args.iter().copied());

        if !job.commitish.is_empty() {
            logger.log(format!("loading specific commit {}", job.commitish));
            if self.deps.toolchain.run(&git(&["status"]).quiet(), logger).await.is_err() {
                return Err(BuildError::NotARepository {
                    commitish: job.commitish.clone(),
                    package: job.package.clone(),
                });
            }
            self.deps
                .toolchain
                .run(&git(&["checkout", &job.commitish]), logger)
                .await
                .map_err(|source| BuildError::Checkout { package: job.package.clone(), source })?;
            return Ok(Some(job.commitish.clone()));
        }

        logger.log("retrieving current commit hash");
        match self.deps.toolchain.run(&git(&["rev-parse", "--short", "HEAD"]).quiet(), logger).await {
            Ok(out) => {
                let commit = out.trim();
                Ok((!commit.is_empty()).then(|| commit.to_string()))
            }
            Err(e) => {
                tracing::debug!(package = %job.package, error = %e, "no commit hash available");
                Ok(None)
            }
        }
    }

    /// Return the checkout to the revision it was on before [`resolve_commit`](Self::resolve_commit).
    pub(super) async fn restore_checkout(&self, job: &Job, ctx: &BuildContext) {
        if job.commitish.is_empty() {
            return;
        }
        let logger = &self.deps.logger;
        logger.log("revert repo back to latest commit");
        let inv = Invocation::new(&self.config.git_bin, &ctx.pkg_dir, ["checkout", "-"]);
        if let Err(e) = self.deps.toolchain.run(&inv, logger).await {
            logger.log(format!("failed to revert commit {}: {}", job.package, e));
        }
    }
}
