// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn linux_amd64() -> Platforms {
    let mut p = Platforms::new();
    p.entry("linux".to_string()).or_default().insert("amd64".to_string(), true);
    p
}

#[test]
fn validate_flattens_platforms() {
    let mut job = Job::new("example/app", "1.0.0");
    job.platforms = Some(linux_amd64());
    job.validate().unwrap();
    assert_eq!(job.osarch, vec!["linux/amd64"]);
}

#[test]
fn platforms_overwrite_supplied_osarch() {
    let mut job = Job::new("example/app", "1.0.0");
    job.osarch = vec!["windows/386".to_string()];
    job.platforms = Some(linux_amd64());
    job.validate().unwrap();
    assert_eq!(job.osarch, vec!["linux/amd64"]);
}

#[test]
fn flat_osarch_is_accepted_without_matrix() {
    let mut job = Job::new("example/app", "1.0.0");
    job.osarch = vec!["darwin/arm64".to_string()];
    job.validate().unwrap();
    assert_eq!(job.platform_pairs()[0].arch, "arm64");
}

#[yare::parameterized(
    missing_package = { "", "1.0.0", &["linux/amd64"], JobError::MissingPackage },
    missing_version = { "example/app", "", &["linux/amd64"], JobError::MissingVersion },
    no_platforms = { "example/app", "1.0.0", &[], JobError::NoPlatforms },
    malformed = { "example/app", "1.0.0", &["linux"], JobError::InvalidPlatform("linux".into()) },
    absolute_package = { "/home/u/pkg", "1.0.0", &["linux/amd64"], JobError::InvalidPackage("/home/u/pkg".into()) },
    escaping_package = { "example/../../etc", "1.0.0", &["linux/amd64"], JobError::InvalidPackage("example/../../etc".into()) },
)]
fn validate_rejects(package: &str, version: &str, osarch: &[&str], expected: JobError) {
    let mut job = Job::new(package, version);
    job.osarch = osarch.iter().map(|s| s.to_string()).collect();
    assert_eq!(job.validate().unwrap_err(), expected);
}

#[yare::parameterized(
    absolute = { "/tmp/outside" },
    parent = { ".." },
    nested_parent = { "cmd/../../elsewhere" },
)]
fn validate_rejects_targets_outside_package(target: &str) {
    let mut job = Job::new("example/app", "1.0.0");
    job.osarch = vec!["linux/amd64".to_string()];
    job.targets = vec![".".to_string(), target.to_string()];
    assert_eq!(job.validate().unwrap_err(), JobError::InvalidTarget(target.to_string()));
}

#[test]
fn nested_relative_paths_are_accepted() {
    let mut job = Job::new("github.com/acme/tool", "1.0.0");
    job.osarch = vec!["linux/amd64".to_string()];
    job.targets = vec![".".to_string(), "./cmd/relay".to_string(), "cmd/..dots".to_string()];
    job.validate().unwrap();
}

#[test]
fn package_is_checked_before_version() {
    let mut job = Job::new("", "");
    assert_eq!(job.validate().unwrap_err(), JobError::MissingPackage);
}

#[test]
fn all_disabled_matrix_is_rejected() {
    let mut job = Job::new("example/app", "1.0.0");
    let mut p = Platforms::new();
    p.entry("linux".to_string()).or_default().insert("amd64".to_string(), false);
    job.platforms = Some(p);
    assert_eq!(job.validate().unwrap_err(), JobError::NoPlatforms);
}

#[test]
fn prepare_fills_defaults_and_injects_version() {
    let mut job = Job::new("example/app", "1.2.3");
    job.error = "stale".to_string();
    job.prepare(JobId::new("abc"));

    assert_eq!(job.id, "abc");
    assert_eq!(job.version_var, DEFAULT_VERSION_VAR);
    assert_eq!(job.commit_var, DEFAULT_COMMIT_VAR);
    assert_eq!(job.label_var, DEFAULT_LABEL_VAR);
    assert_eq!(job.variables.get("main.VERSION").map(String::as_str), Some("1.2.3"));
    assert_eq!(job.targets, vec!["."]);
    assert!(job.queued);
    assert!(!job.completed);
    assert!(job.error.is_empty());
}

#[test]
fn prepare_keeps_custom_names_and_targets() {
    let mut job = Job::new("example/app", "2.0");
    job.version_var = "main.Version".to_string();
    job.targets = vec!["cmd/cli".to_string()];
    job.prepare(JobId::new("x"));
    assert_eq!(job.variables.get("main.Version").map(String::as_str), Some("2.0"));
    assert!(!job.variables.contains_key(DEFAULT_VERSION_VAR));
    assert_eq!(job.targets, vec!["cmd/cli"]);
}

#[test]
fn phase_follows_flags() {
    let mut job = Job::new("p", "v");
    job.queued = true;
    assert_eq!(job.phase(), JobPhase::Queued);
    job.queued = false;
    assert_eq!(job.phase(), JobPhase::Running);
    job.completed = true;
    assert_eq!(job.phase(), JobPhase::Succeeded);
    job.error = "no files compiled".to_string();
    assert_eq!(job.phase(), JobPhase::Failed);
    assert_eq!(job.phase().to_string(), "failed");
}

#[test]
fn request_json_uses_camel_case_and_ignores_releaser() {
    let json = r#"{
        "name": "example/app",
        "version": "1.0.0",
        "goGet": true,
        "versionVar": "main.V",
        "platforms": {"linux": {"amd64": true}},
        "releaser": "local"
    }"#;
    let job: Job = serde_json::from_str(json).unwrap();
    assert_eq!(job.package, "example/app");
    assert!(job.go_get);
    assert_eq!(job.version_var, "main.V");
    assert!(job.releaser.is_none());
    assert!(job.platforms.is_some());
}
