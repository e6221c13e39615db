// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve state directory: GOX_STATE_DIR > XDG_STATE_HOME/gox > ~/.local/state/gox
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("GOX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("gox"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/gox"))
}

/// Root of per-job build directories. Cleared on every start.
pub fn build_dir() -> PathBuf {
    std::env::var("GOX_BUILD_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("cloudgox"))
}

/// Shared GOPATH holding packages for local (non `go get`) builds.
pub fn source_root() -> Option<PathBuf> {
    std::env::var("GOPATH").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Go toolchain binary name or path (default `go`).
pub fn go_bin() -> String {
    std::env::var("GOX_GO_BIN").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "go".to_string())
}

/// Git binary name or path (default `git`).
pub fn git_bin() -> String {
    std::env::var("GOX_GIT_BIN").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "git".to_string())
}

/// Directory for the `local` release host. Every submitted job is released
/// there when set.
pub fn release_dir() -> Option<PathBuf> {
    std::env::var("GOX_RELEASE_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("GOX_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP port for remote connections. When set, the daemon listens on this port
/// in addition to the Unix socket.
pub fn tcp_port() -> Option<u16> {
    std::env::var("GOX_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// GitHub personal access token used to fetch private repositories
/// (`GH_PAN`).
pub fn github_token() -> Option<String> {
    std::env::var("GH_PAN").ok().filter(|s| !s.is_empty())
}

/// How long shutdown waits for the running build (default 5s,
/// `GOX_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("GOX_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
