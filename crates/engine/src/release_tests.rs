// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

struct RejectingHost;

#[async_trait]
impl ReleaseHost for RejectingHost {
    async fn authenticate(&self) -> Result<(), ReleaseError> {
        Err(ReleaseError::Unauthenticated { host: "remote".into(), reason: "no token".into() })
    }

    async fn setup(
        &self,
        _package: &str,
        _version: &str,
        _notes: &str,
    ) -> Result<Box<dyn Release>, ReleaseError> {
        Err(ReleaseError::Setup("unreachable".into()))
    }
}

#[tokio::test]
async fn directory_host_writes_notes_and_assets() {
    let dir = TempDir::new().unwrap();
    let host = DirectoryReleaseHost::new(dir.path().join("releases"));
    host.authenticate().await.unwrap();

    let release = host.setup("example/app", "1.0.0", "notes here").await.unwrap();
    release.upload("app_linux_amd64.gz", b"gz bytes").await.unwrap();

    let release_dir = dir.path().join("releases/app/1.0.0");
    assert_eq!(std::fs::read_to_string(release_dir.join("RELEASE_NOTES.md")).unwrap(), "notes here");
    assert_eq!(std::fs::read(release_dir.join("app_linux_amd64.gz")).unwrap(), b"gz bytes");
}

#[tokio::test]
async fn directory_upload_rejects_non_file_names() {
    let dir = TempDir::new().unwrap();
    let host = DirectoryReleaseHost::new(dir.path());
    let release = host.setup("app", "1", "").await.unwrap();
    assert!(release.upload("..", b"x").await.is_err());
}

#[tokio::test]
async fn authenticate_all_reports_only_successful_hosts() {
    let dir = TempDir::new().unwrap();
    let registry = ReleaseRegistry::new()
        .with(DirectoryReleaseHost::NAME, Arc::new(DirectoryReleaseHost::new(dir.path())))
        .with("remote", Arc::new(RejectingHost));
    let (logger, mut rx) = Logger::channel();

    let ok = registry.authenticate_all(&logger).await;
    assert_eq!(ok, vec!["local".to_string()]);

    drop(logger);
    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }
    assert!(lines.contains(&"local authenticated".to_string()));
    assert!(lines.iter().any(|l| l.contains("remote is not authenticated")));
}

#[test]
fn registry_lookup_by_name() {
    let registry = ReleaseRegistry::new().with("fake", Arc::new(FakeReleaseHost::new()));
    assert!(registry.get("fake").is_some());
    assert!(registry.get("github").is_none());
}

#[test]
fn release_notes_include_timestamp_and_toolchain() {
    let notes = release_notes(0, "go1.22.1");
    assert!(notes.contains("1970-01-01T00:00:00Z"), "{}", notes);
    assert!(notes.contains("go1.22.1"));
}
