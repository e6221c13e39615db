// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional per-job release publication.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::logger::Logger;
use crate::release::{Release, ReleaseHost};

/// Lazily created release for one job.
///
/// The release is set up on the first artifact and reused for the rest. A
/// failed setup is remembered, so later artifacts skip publication without
/// retrying.
pub(super) struct ReleaseSession {
    host_name: String,
    host: Arc<dyn ReleaseHost>,
    package: String,
    version: String,
    notes: String,
    release: OnceCell<Option<Box<dyn Release>>>,
}

impl ReleaseSession {
    pub(super) fn new(
        host_name: impl Into<String>,
        host: Arc<dyn ReleaseHost>,
        package: impl Into<String>,
        version: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            host_name: host_name.into(),
            host,
            package: package.into(),
            version: version.into(),
            notes: notes.into(),
            release: OnceCell::new(),
        }
    }

    /// Upload one compressed artifact. Failures are logged only.
    pub(super) async fn publish(&self, logger: &Logger, file: &str, bytes: &[u8]) {
        let release = self.release.get_or_init(|| self.setup(logger)).await;
        let Some(release) = release else {
            return;
        };
        match release.upload(file, bytes).await {
            Ok(()) => logger.log(format!("{} included asset in release {}", self.host_name, file)),
            Err(e) => logger.log(format!("{} failed to release asset {}: {}", self.host_name, file, e)),
        }
    }

    async fn setup(&self, logger: &Logger) -> Option<Box<dyn Release>> {
        match self.host.setup(&self.package, &self.version, &self.notes).await {
            Ok(release) => {
                logger.log(format!(
                    "{} successfully setup release {} ({})",
                    self.host_name, self.package, self.version
                ));
                Some(release)
            }
            Err(e) => {
                logger.log(format!("{} failed to setup release {} ({})", self.host_name, self.package, e));
                None
            }
        }
    }
}
