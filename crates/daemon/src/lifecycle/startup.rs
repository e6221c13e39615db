// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use gox_engine::{
    DirectoryReleaseHost, Orchestrator, OrchestratorConfig, OrchestratorDeps, ProcessToolchain,
    ReleaseRegistry,
};
use gox_wire::ServerConfig;
use tokio::net::{TcpListener, UnixListener};
use tracing::info;

use super::{configure_github_token, go_arch, probe_toolchain, Config, DaemonState, LifecycleError, StartupResult};
use crate::env::PROTOCOL_VERSION;

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A failed lock means these files belong to the running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. State directory and exclusive lock
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 2. Toolchain
    let toolchain = probe_toolchain(&config.go_bin, &config.git_bin, &ProcessToolchain).await?;
    info!(
        go = %toolchain.go_path.display(),
        git = %toolchain.git_path.display(),
        version = %toolchain.version,
        platforms = toolchain.platforms.values().map(|a| a.len()).sum::<usize>(),
        "toolchain ready"
    );
    let server_config = ServerConfig {
        version: PROTOCOL_VERSION.to_string(),
        bin: toolchain.go_path.to_string_lossy().into_owned(),
        os: std::env::consts::OS.to_string(),
        arch: go_arch(std::env::consts::ARCH).to_string(),
        num_cpu: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        platforms: toolchain.platforms,
        bin_version: toolchain.version.clone(),
    };

    // 3. Release hosts
    let mut releases = ReleaseRegistry::new();
    if let Some(dir) = &config.release_dir {
        info!(dir = %dir.display(), "local release host enabled");
        releases.register(DirectoryReleaseHost::NAME, Arc::new(DirectoryReleaseHost::new(dir)));
    }

    // 4. Build service
    let orchestrator_config = OrchestratorConfig {
        source_root: config.source_root.clone(),
        go_bin: server_config.bin.clone(),
        git_bin: toolchain.git_path.to_string_lossy().into_owned(),
        toolchain_version: toolchain.version,
        ..OrchestratorConfig::new(&config.build_dir)
    };
    let git_bin = orchestrator_config.git_bin.clone();
    let orchestrator = Orchestrator::start(orchestrator_config, OrchestratorDeps::system(releases)).await?;
    if let Some(token) = &config.github_token {
        configure_github_token(&git_bin, token, &ProcessToolchain, orchestrator.logger()).await;
    }

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;
    let tcp = match config.tcp_port {
        Some(port) => {
            let addr = format!("0.0.0.0:{}", port);
            let tcp = TcpListener::bind(&addr)
                .await
                .map_err(|e| LifecycleError::BindFailed(addr.into(), e))?;
            info!("listening on TCP port {}", port);
            Some(tcp)
        }
        None => None,
    };

    info!(socket = %config.socket_path.display(), "daemon started");
    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            orchestrator: Arc::new(orchestrator),
            server_config,
            start_time: Instant::now(),
        },
        listener,
        tcp,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
