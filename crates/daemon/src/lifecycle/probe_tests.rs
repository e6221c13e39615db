// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use gox_engine::ToolError;
use std::ffi::OsString;
use tempfile::TempDir;
use yare::parameterized;

/// Answers `go tool dist list` and `go version` with canned output.
struct CannedGo {
    fail_list: bool,
}

#[async_trait]
impl Toolchain for CannedGo {
    async fn run(&self, invocation: &Invocation, _logger: &Logger) -> Result<String, ToolError> {
        match invocation.subcommand() {
            Some("tool") if self.fail_list => Err(ToolError::Failed {
                command: invocation.to_string(),
                status: "exit status: 2".into(),
                stderr: "go tool: no such tool \"dist\"".into(),
            }),
            Some("tool") => Ok("linux/amd64\nlinux/arm64\ndarwin/arm64\n".into()),
            Some("version") => Ok("go version go1.22.0 linux/amd64\n".into()),
            _ => Ok(String::new()),
        }
    }
}

fn fake_bin(dir: &Path, name: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    path
}

fn path_of(dirs: &[&Path]) -> OsString {
    std::env::join_paths(dirs).unwrap()
}

#[test]
fn find_executable_searches_path_in_order() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    fake_bin(b.path(), "go", 0o755);
    let first = fake_bin(a.path(), "go", 0o755);

    let found = find_executable("go", Some(&path_of(&[a.path(), b.path()])));
    assert_eq!(found, Some(first));
}

#[test]
fn find_executable_skips_non_executable_files() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    fake_bin(a.path(), "git", 0o644);
    let real = fake_bin(b.path(), "git", 0o755);

    assert_eq!(find_executable("git", Some(&path_of(&[a.path(), b.path()]))), Some(real));
}

#[test]
fn find_executable_accepts_explicit_paths() {
    let dir = TempDir::new().unwrap();
    let bin = fake_bin(dir.path(), "go1.22", 0o755);
    let name = bin.to_str().unwrap();

    assert_eq!(find_executable(name, None), Some(bin.clone()));
    assert_eq!(find_executable("go1.22", None), None);
}

#[tokio::test]
#[serial_test::serial]
async fn probe_collects_platforms_and_version() {
    let dir = TempDir::new().unwrap();
    let go = fake_bin(dir.path(), "go", 0o755);
    let git = fake_bin(dir.path(), "git", 0o755);

    let info = probe_toolchain(go.to_str().unwrap(), git.to_str().unwrap(), &CannedGo { fail_list: false })
        .await
        .unwrap();

    assert_eq!(info.version, "go1.22.0 linux/amd64");
    assert_eq!(info.platforms.len(), 2);
    assert_eq!(info.platforms["linux"].len(), 2);
    assert!(!info.platforms["darwin"]["arm64"]);
}

#[tokio::test]
#[serial_test::serial]
async fn probe_reports_missing_tools_and_old_compilers() {
    let dir = TempDir::new().unwrap();
    let go = fake_bin(dir.path(), "go", 0o755);
    let missing = dir.path().join("no-git");

    let err = probe_toolchain(go.to_str().unwrap(), missing.to_str().unwrap(), &CannedGo { fail_list: false })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "git is not installed");

    let git = fake_bin(dir.path(), "git", 0o755);
    let err = probe_toolchain(go.to_str().unwrap(), git.to_str().unwrap(), &CannedGo { fail_list: true })
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::PlatformList(_)));
}

#[parameterized(
    amd64 = { "x86_64", "amd64" },
    arm64 = { "aarch64", "arm64" },
    i386 = { "x86", "386" },
    passthrough = { "riscv64", "riscv64" },
)]
fn go_arch_names(rust: &str, go: &str) {
    assert_eq!(go_arch(rust), go);
}
