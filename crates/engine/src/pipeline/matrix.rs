// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The target × platform build matrix.

use std::path::Path;

use gox_core::{Environ, Job, OsArch};
use thiserror::Error;

use super::artifact::{self, GZIP_SUFFIX};
use super::publish::ReleaseSession;
use super::{BuildContext, BuildReport, CellOutcome, Pipeline};
use crate::release::release_notes;
use crate::toolchain::{Invocation, ToolError};

/// Why a single cell produced no artifact.
#[derive(Debug, Error)]
enum CellError {
    #[error("failed to find target {0}")]
    MissingTarget(String),

    #[error("failed to build {file}: {source}")]
    Build {
        file: String,
        #[source]
        source: ToolError,
    },

    #[error("asset local write failed {0}")]
    Io(#[from] std::io::Error),
}

impl Pipeline {
    pub(super) async fn execute_matrix(&self, job: &mut Job, ctx: &BuildContext, ldflags: &str) -> BuildReport {
        let logger = &self.deps.logger;
        let mut report = BuildReport::default();
        let session = self.release_session(job);
        let targets = job.targets.clone();
        let pairs = job.platform_pairs();

        for target in &targets {
            let target_dir = ctx.pkg_dir.join(target);
            let label = display_target(&job.package, target);
            let name = target_name(&job.package, target);

            if job.go_get && !is_package_root(target) {
                let inv = Invocation::new(&self.config.go_bin, &target_dir, ["get", "-v", "-d", "."])
                    .env(ctx.env.clone());
                if let Err(e) = self.deps.toolchain.run(&inv, logger).await {
                    logger.log(format!("failed to get dependencies of subdirectory {}", target));
                    report.cells.push(skipped(target, None, e.to_string()));
                    continue;
                }
            }
            if job.go_generate {
                let inv = Invocation::new(&self.config.go_bin, &target_dir, ["generate"]).env(ctx.env.clone());
                if let Err(e) = self.deps.toolchain.run(&inv, logger).await {
                    logger.log(format!("failed to generate {}", job.package));
                    report.cells.push(skipped(target, None, e.to_string()));
                    continue;
                }
            }

            for pair in &pairs {
                let result = self
                    .build_cell(job, ctx, &target_dir, &label, &name, pair, ldflags, session.as_ref())
                    .await;
                match result {
                    Ok(file) => {
                        logger.log(format!("compiled {}", file));
                        job.files.push(file.clone());
                        self.deps.state.sync_job(job);
                        report.cells.push(CellOutcome::Built {
                            target: target.clone(),
                            osarch: pair.to_string(),
                            file,
                        });
                    }
                    Err(e) => {
                        logger.log(e.to_string());
                        report.cells.push(skipped(target, Some(pair.to_string()), e.to_string()));
                    }
                }
            }
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn build_cell(
        &self,
        job: &Job,
        ctx: &BuildContext,
        target_dir: &Path,
        label: &str,
        name: &str,
        pair: &OsArch,
        ldflags: &str,
        session: Option<&ReleaseSession>,
    ) -> Result<String, CellError> {
        let logger = &self.deps.logger;
        let binary = pair.binary_name(name);
        let raw = ctx.job_dir.join(&binary);
        if !tokio::fs::try_exists(target_dir).await.unwrap_or(false) {
            return Err(CellError::MissingTarget(label.to_string()));
        }

        let mut args = vec![
            "build".to_string(),
            "-a".to_string(),
            "-v".to_string(),
            "-ldflags".to_string(),
            ldflags.to_string(),
            "-o".to_string(),
            raw.to_string_lossy().into_owned(),
        ];
        if !job.tags.is_empty() {
            args.push("-tags".to_string());
            args.push(job.tags.clone());
        }
        args.push(".".to_string());

        let env = cell_env(&ctx.env, pair, job.cgo);
        if !job.cgo {
            logger.log("cgo disabled");
        }
        for (k, v) in env.iter() {
            logger.log(format!("env: {}={}", k, v));
        }

        let inv = Invocation::new(&self.config.go_bin, target_dir, args).env(env);
        self.deps
            .toolchain
            .run(&inv, logger)
            .await
            .map_err(|source| CellError::Build { file: binary.clone(), source })?;

        let compressed = artifact::read_compressed(&raw).await?;
        let file = format!("{}{}", binary, GZIP_SUFFIX);
        if let Some(session) = session {
            session.publish(logger, &file, &compressed).await;
        }
        artifact::swap(&raw, &compressed).await?;
        Ok(file)
    }

    fn release_session(&self, job: &Job) -> Option<ReleaseSession> {
        let host_name = job.releaser.as_deref()?;
        let Some(host) = self.deps.releases.get(host_name) else {
            self.deps.logger.log(format!("unknown releaser {}", host_name));
            return None;
        };
        let notes = release_notes(self.deps.clock.epoch_ms(), &self.config.toolchain_version);
        Some(ReleaseSession::new(host_name, host, &job.package, &job.version, notes))
    }
}

/// Build environment for one cell: the job environment plus the target
/// platform, with cgo disabled unless requested.
pub(super) fn cell_env(base: &Environ, pair: &OsArch, cgo: bool) -> Environ {
    let mut env = base.clone();
    env.set("GOOS", &pair.os);
    env.set("GOARCH", &pair.arch);
    if !cgo {
        env.set("CGO_ENABLED", "0");
    }
    env
}

fn skipped(target: &str, osarch: Option<String>, reason: String) -> CellOutcome {
    CellOutcome::Skipped { target: target.to_string(), osarch, reason }
}

fn is_package_root(target: &str) -> bool {
    clean_path(target).is_empty()
}

fn display_target(package: &str, target: &str) -> String {
    clean_path(&format!("{}/{}", package, target)).join("/")
}

/// Lexically normalized path components, with `.` and `..` resolved.
fn clean_path(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts
}

/// Artifact base name for `target` within `package`: the last component of
/// the joined, normalized path.
///
/// ```
/// # use gox_engine::pipeline::target_name;
/// assert_eq!(target_name("github.com/acme/tool", "."), "tool");
/// assert_eq!(target_name("github.com/acme/tool", "cmd/relay"), "relay");
/// ```
pub fn target_name(package: &str, target: &str) -> String {
    let joined = format!("{}/{}", package, target);
    clean_path(&joined).last().map(|s| s.to_string()).unwrap_or_else(|| ".".to_string())
}
