// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

mod github;
mod probe;
mod startup;
pub use github::configure_github_token;
pub use probe::{find_executable, go_arch, probe_toolchain, ToolchainInfo};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gox_engine::{Orchestrator, OrchestratorError, ToolError};
use gox_wire::ServerConfig;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tracing::{info, warn};

use crate::env;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/gox)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Per-job build directories, cleared on start
    pub build_dir: PathBuf,
    /// Shared GOPATH for local builds
    pub source_root: Option<PathBuf>,
    pub go_bin: String,
    pub git_bin: String,
    /// Enables the `local` release host
    pub release_dir: Option<PathBuf>,
    pub tcp_port: Option<u16>,
    /// Rewrites github.com fetches to an authenticated URL when set
    pub github_token: Option<String>,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            build_dir: env::build_dir(),
            source_root: env::source_root(),
            go_bin: env::go_bin(),
            git_bin: env::git_bin(),
            release_dir: env::release_dir(),
            tcp_port: env::tcp_port(),
            github_token: env::github_token(),
            state_dir,
        })
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub orchestrator: Arc<Orchestrator>,
    pub server_config: ServerConfig,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state plus bound listeners.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
    pub tcp: Option<TcpListener>,
}

impl DaemonState {
    /// Stop accepting jobs and wait up to `drain` for the running build.
    ///
    /// The orchestrator is only drained when no listener task still holds a
    /// handle to it; otherwise the process exit tears it down.
    pub async fn shutdown(self, drain: Duration) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        let Self { config, lock_file, orchestrator, start_time, .. } = self;

        match Arc::try_unwrap(orchestrator) {
            Ok(orchestrator) => {
                if tokio::time::timeout(drain, orchestrator.shutdown()).await.is_err() {
                    warn!("build still running after {:?}, abandoning it", drain);
                }
            }
            Err(_) => warn!("orchestrator still in use, skipping drain"),
        }

        if config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        drop(lock_file);
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!("Failed to remove lock file: {}", e);
        }

        info!(uptime_secs = start_time.elapsed().as_secs(), "Daemon shutdown complete");
        Ok(())
    }
}

/// Errors that can occur during daemon lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("{0} is not installed")]
    ToolNotFound(String),

    #[error("failed to list platforms (go 1.7 or higher required): {0}")]
    PlatformList(#[source] ToolError),

    #[error("failed to read toolchain version: {0}")]
    ToolVersion(#[source] ToolError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
