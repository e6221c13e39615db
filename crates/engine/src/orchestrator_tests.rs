// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::release::FakeReleaseHost;
use crate::toolchain::FakeToolchain;
use gox_core::{FakeClock, JobPhase, SequentialIdGen};
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    toolchain: FakeToolchain,
    host: FakeReleaseHost,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("gopath/src/example/app")).unwrap();
        Self { dir, toolchain: FakeToolchain::new(), host: FakeReleaseHost::new() }
    }

    fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            source_root: Some(self.dir.path().join("gopath")),
            toolchain_version: "go1.22.0".to_string(),
            ..OrchestratorConfig::new(self.dir.path().join("builds"))
        }
    }

    fn deps(&self) -> OrchestratorDeps {
        OrchestratorDeps {
            toolchain: Arc::new(self.toolchain.clone()),
            releases: ReleaseRegistry::new().with("fake", Arc::new(self.host.clone())),
            clock: Arc::new(FakeClock::new()),
            ids: Arc::new(SequentialIdGen::new("job")),
        }
    }

    async fn start(&self) -> Orchestrator {
        Orchestrator::start(self.config(), self.deps()).await.unwrap()
    }
}

fn job() -> Job {
    let mut job = Job::new("example/app", "1.0.0");
    job.osarch = vec!["linux/amd64".to_string(), "windows/amd64".to_string()];
    job
}

async fn wait_until(orch: &Orchestrator, f: impl FnMut(&Arc<ServerState>) -> bool) {
    let mut rx = orch.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(f)).await.unwrap().unwrap();
}

fn has_log(state: &ServerState, text: &str) -> bool {
    state.log.messages().iter().any(|m| m.message == text)
}

#[tokio::test]
async fn start_clears_build_dir_and_marks_ready() {
    let fx = Fixture::new();
    let stale = fx.dir.path().join("builds/old-job");
    std::fs::create_dir_all(&stale).unwrap();

    let orch = fx.start().await;

    assert!(!stale.exists());
    assert!(orch.workspace().path().is_dir());
    assert!(orch.snapshot().ready);
    wait_until(&orch, |s| has_log(s, "gox started") && has_log(s, "fake authenticated")).await;
}

#[tokio::test]
async fn submitted_job_is_built_and_recorded() {
    let fx = Fixture::new();
    let orch = fx.start().await;

    let id = orch.submit(job()).unwrap();
    wait_until(&orch, |s| s.num_done == 1).await;

    let snap = orch.snapshot();
    let done = snap.job(&id).unwrap();
    assert_eq!(done.phase(), JobPhase::Succeeded);
    assert_eq!(done.files, vec!["app_linux_amd64.gz", "app_windows_amd64.exe.gz"]);
    assert_eq!(snap.num_total, 1);
    assert!(snap.ready);
    for file in &done.files {
        assert!(orch.workspace().artifact(&id, file).unwrap().is_file());
    }
    wait_until(&orch, |s| has_log(s, "enqueue compilation (job-1 #1)")).await;
}

#[tokio::test]
async fn releaser_receives_artifacts() {
    let fx = Fixture::new();
    let orch = fx.start().await;
    let mut job = job();
    job.releaser = Some("fake".to_string());

    orch.submit(job).unwrap();
    wait_until(&orch, |s| s.num_done == 1).await;

    assert_eq!(fx.host.setups().len(), 1);
    assert_eq!(fx.host.uploads().len(), 2);
}

#[tokio::test]
async fn failed_job_keeps_error_and_service_continues() {
    let fx = Fixture::new();
    fx.toolchain.fail_build_for_os("linux");
    let orch = fx.start().await;
    let mut only_linux = job();
    only_linux.osarch = vec!["linux/amd64".to_string()];

    let failed = orch.submit(only_linux).unwrap();
    let ok = orch.submit(job()).unwrap();
    wait_until(&orch, |s| s.num_done == 2).await;

    let snap = orch.snapshot();
    assert_eq!(snap.job(&failed).unwrap().error, "no files compiled");
    assert_eq!(snap.job(&ok).unwrap().files, vec!["app_windows_amd64.exe.gz"]);
    assert_eq!(snap.jobs[0].id, ok);
}

#[tokio::test]
async fn invalid_job_is_rejected_synchronously() {
    let fx = Fixture::new();
    let orch = fx.start().await;

    let err = orch.submit(Job::new("", "1.0.0")).unwrap_err();

    assert_eq!(err.to_string(), "missing package");
    assert_eq!(orch.snapshot().num_total, 0);
}

#[tokio::test]
async fn shutdown_drains_log_and_worker() {
    let fx = Fixture::new();
    let orch = fx.start().await;
    orch.submit(job()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), orch.shutdown()).await.unwrap();

    assert_eq!(fx.toolchain.calls_for("build").len(), 2);
}
