// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release hosts: where finished artifacts can be published.
//!
//! A host is registered by name. Jobs opt in by naming a host; the pipeline
//! sets up one release per job the first time an artifact is ready and then
//! uploads each compressed artifact to it. Release failures are logged and
//! never fail the job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::logger::Logger;

/// Errors from release hosts
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("{host} is not authenticated: {reason}")]
    Unauthenticated { host: String, reason: String },

    #[error("release setup failed: {0}")]
    Setup(String),

    #[error("upload of {name} failed: {reason}")]
    Upload { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A release created on a host, accepting asset uploads.
#[async_trait]
pub trait Release: Send + Sync {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(), ReleaseError>;
}

/// Capability to publish artifacts to an external host.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Check credentials. Called once per host at startup.
    async fn authenticate(&self) -> Result<(), ReleaseError>;

    async fn setup(
        &self,
        package: &str,
        version: &str,
        notes: &str,
    ) -> Result<Box<dyn Release>, ReleaseError>;
}

/// Named release hosts available to jobs.
#[derive(Clone, Default)]
pub struct ReleaseRegistry {
    hosts: BTreeMap<String, Arc<dyn ReleaseHost>>,
}

impl ReleaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, host: Arc<dyn ReleaseHost>) {
        self.hosts.insert(name.into(), host);
    }

    pub fn with(mut self, name: impl Into<String>, host: Arc<dyn ReleaseHost>) -> Self {
        self.register(name, host);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ReleaseHost>> {
        self.hosts.get(name).cloned()
    }

    /// Authenticate every host, logging the outcome of each.
    ///
    /// Returns the names that authenticated. A failing host stays registered
    /// but its setups will likely fail too; nothing here is fatal.
    pub async fn authenticate_all(&self, logger: &Logger) -> Vec<String> {
        let mut ok = Vec::new();
        for (name, host) in &self.hosts {
            match host.authenticate().await {
                Ok(()) => {
                    logger.log(format!("{} authenticated", name));
                    ok.push(name.clone());
                }
                Err(e) => {
                    tracing::warn!(host = %name, error = %e, "release host authentication failed");
                    logger.log(format!("{}", e));
                }
            }
        }
        ok
    }
}

/// Release notes attached to every automatically created release.
pub fn release_notes(published_at_ms: u64, toolchain_version: &str) -> String {
    let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(published_at_ms as i64)
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default();
    format!(
        "*This release was automatically cross-compiled and uploaded by gox at {}* using *{}*",
        when, toolchain_version
    )
}

/// Publishes releases into a local directory tree:
/// `<root>/<package basename>/<version>/`.
pub struct DirectoryReleaseHost {
    root: PathBuf,
}

impl DirectoryReleaseHost {
    pub const NAME: &'static str = "local";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn release_dir(&self, package: &str, version: &str) -> PathBuf {
        let name = Path::new(package).file_name().map(|n| n.to_owned()).unwrap_or_default();
        self.root.join(name).join(version)
    }
}

struct DirectoryRelease {
    dir: PathBuf,
}

#[async_trait]
impl Release for DirectoryRelease {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(), ReleaseError> {
        let file_name = Path::new(name).file_name().ok_or_else(|| ReleaseError::Upload {
            name: name.to_string(),
            reason: "not a file name".to_string(),
        })?;
        tokio::fs::write(self.dir.join(file_name), bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ReleaseHost for DirectoryReleaseHost {
    async fn authenticate(&self) -> Result<(), ReleaseError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| ReleaseError::Unauthenticated {
            host: Self::NAME.to_string(),
            reason: format!("cannot use {}: {}", self.root.display(), e),
        })
    }

    async fn setup(
        &self,
        package: &str,
        version: &str,
        notes: &str,
    ) -> Result<Box<dyn Release>, ReleaseError> {
        let dir = self.release_dir(package, version);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ReleaseError::Setup(format!("{}: {}", dir.display(), e)))?;
        tokio::fs::write(dir.join("RELEASE_NOTES.md"), notes).await?;
        Ok(Box::new(DirectoryRelease { dir }))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Release, ReleaseError, ReleaseHost};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeReleaseState {
        setups: Vec<(String, String)>,
        uploads: Vec<(String, usize)>,
        fail_setup: bool,
        fail_upload: bool,
    }

    /// Release host double recording setups and uploads.
    #[derive(Clone, Default)]
    pub struct FakeReleaseHost {
        inner: Arc<Mutex<FakeReleaseState>>,
    }

    impl FakeReleaseHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_setup(self) -> Self {
            self.inner.lock().fail_setup = true;
            self
        }

        pub fn failing_upload(self) -> Self {
            self.inner.lock().fail_upload = true;
            self
        }

        /// `(package, version)` per setup call.
        pub fn setups(&self) -> Vec<(String, String)> {
            self.inner.lock().setups.clone()
        }

        /// `(name, byte length)` per successful upload.
        pub fn uploads(&self) -> Vec<(String, usize)> {
            self.inner.lock().uploads.clone()
        }
    }

    struct FakeRelease {
        inner: Arc<Mutex<FakeReleaseState>>,
    }

    #[async_trait]
    impl Release for FakeRelease {
        async fn upload(&self, name: &str, bytes: &[u8]) -> Result<(), ReleaseError> {
            let mut inner = self.inner.lock();
            if inner.fail_upload {
                return Err(ReleaseError::Upload {
                    name: name.to_string(),
                    reason: "fake failure".to_string(),
                });
            }
            inner.uploads.push((name.to_string(), bytes.len()));
            Ok(())
        }
    }

    #[async_trait]
    impl ReleaseHost for FakeReleaseHost {
        async fn authenticate(&self) -> Result<(), ReleaseError> {
            Ok(())
        }

        async fn setup(
            &self,
            package: &str,
            version: &str,
            _notes: &str,
        ) -> Result<Box<dyn Release>, ReleaseError> {
            let mut inner = self.inner.lock();
            inner.setups.push((package.to_string(), version.to_string()));
            if inner.fail_setup {
                return Err(ReleaseError::Setup("fake failure".to_string()));
            }
            Ok(Box::new(FakeRelease { inner: Arc::clone(&self.inner) }))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReleaseHost;

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
