// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Toolchain discovery at startup.

use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use gox_core::{platforms_from_list, Platforms};
use gox_engine::{Invocation, Logger, Toolchain};

use super::LifecycleError;

/// What the daemon learned about the installed toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolchainInfo {
    pub go_path: PathBuf,
    pub git_path: PathBuf,
    /// Every `os/arch` the compiler supports, all disabled.
    pub platforms: Platforms,
    /// e.g. `go1.22.0 linux/amd64`
    pub version: String,
}

/// Resolve `name` against `path_var` the way a shell would. Names containing
/// a separator are checked as given.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    std::env::split_paths(path_var?).map(|dir| dir.join(name)).find(|p| is_executable(p))
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

/// Locate `git` and `go`, then ask the compiler for its platform list and
/// version.
pub async fn probe_toolchain(
    go_bin: &str,
    git_bin: &str,
    toolchain: &dyn Toolchain,
) -> Result<ToolchainInfo, LifecycleError> {
    let path_var = std::env::var_os("PATH");
    let git_path =
        find_executable(git_bin, path_var.as_deref()).ok_or_else(|| LifecycleError::ToolNotFound("git".into()))?;
    let go_path =
        find_executable(go_bin, path_var.as_deref()).ok_or_else(|| LifecycleError::ToolNotFound("go".into()))?;

    // Quiet invocations never log, so the receiver can be dropped.
    let (logger, _) = Logger::channel();
    let cwd = std::env::temp_dir();
    let go = go_path.to_string_lossy().into_owned();

    let list = Invocation::new(&go, &cwd, ["tool", "dist", "list"]).quiet();
    let listed = toolchain.run(&list, &logger).await.map_err(LifecycleError::PlatformList)?;
    let platforms = platforms_from_list(&listed);

    let version = Invocation::new(&go, &cwd, ["version"]).quiet();
    let out = toolchain.run(&version, &logger).await.map_err(LifecycleError::ToolVersion)?;
    let version = out.trim().trim_start_matches("go version").trim().to_string();

    Ok(ToolchainInfo { go_path, git_path, platforms, version })
}

/// Go's name for the host architecture.
pub fn go_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
