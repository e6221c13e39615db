// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gox_core::{FakeClock, Job, SequentialIdGen};
use gox_engine::{FakeReleaseHost, FakeToolchain, OrchestratorConfig, OrchestratorDeps, ReleaseRegistry};
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Fixture {
    _dir: TempDir,
    ctx: Arc<ListenCtx>,
    host: FakeReleaseHost,
}

async fn fixture(releaser: Option<&str>) -> Fixture {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("gopath/src/example/app")).unwrap();
    let host = FakeReleaseHost::new();
    let config = OrchestratorConfig {
        source_root: Some(dir.path().join("gopath")),
        ..OrchestratorConfig::new(dir.path().join("builds"))
    };
    let deps = OrchestratorDeps {
        toolchain: Arc::new(FakeToolchain::new()),
        releases: ReleaseRegistry::new().with("fake", Arc::new(host.clone())),
        clock: Arc::new(FakeClock::new()),
        ids: Arc::new(SequentialIdGen::new("job")),
    };
    let orchestrator = Orchestrator::start(config, deps).await.unwrap();
    let server_config = ServerConfig {
        version: PROTOCOL_VERSION.to_string(),
        bin: "/usr/local/go/bin/go".to_string(),
        os: "linux".to_string(),
        arch: "amd64".to_string(),
        num_cpu: 4,
        bin_version: "go1.22.0 linux/amd64".to_string(),
        ..ServerConfig::default()
    };
    let ctx = Arc::new(ListenCtx {
        orchestrator: Arc::new(orchestrator),
        server_config,
        releaser: releaser.map(str::to_string),
    });
    Fixture { _dir: dir, ctx, host }
}

fn job() -> Job {
    let mut job = Job::new("example/app", "1.0.0");
    job.osarch = vec!["linux/amd64".to_string()];
    job
}

/// Send one request over an in-memory pipe and read the first response.
async fn roundtrip(ctx: &Arc<ListenCtx>, request: Request) -> Response {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let ctx = Arc::clone(ctx);
    let handle = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server);
        handle_connection(reader, writer, &ctx).await
    });
    let (mut reader, mut writer) = tokio::io::split(client);
    wire::write_request(&mut writer, &request, TIMEOUT).await.unwrap();
    let response = wire::read_response(&mut reader, TIMEOUT).await.unwrap();
    handle.await.unwrap().unwrap();
    response
}

async fn wait_done(ctx: &ListenCtx, n: u64) {
    let mut rx = ctx.orchestrator.subscribe();
    tokio::time::timeout(TIMEOUT, rx.wait_for(|s| s.num_done == n)).await.unwrap().unwrap();
}

#[tokio::test]
async fn ping_and_hello() {
    let fx = fixture(None).await;
    assert_eq!(roundtrip(&fx.ctx, Request::Ping).await, Response::Pong);
    assert_eq!(
        roundtrip(&fx.ctx, Request::Hello { version: "0.0.1".to_string() }).await,
        Response::Hello { version: PROTOCOL_VERSION.to_string() }
    );
}

#[tokio::test]
async fn config_returns_server_facts() {
    let fx = fixture(None).await;
    let Response::Config { config } = roundtrip(&fx.ctx, Request::Config).await else {
        panic!("expected Config");
    };
    assert_eq!(config, fx.ctx.server_config);
}

#[tokio::test]
async fn submit_returns_assigned_id() {
    let fx = fixture(None).await;
    let response = roundtrip(&fx.ctx, Request::Submit { job: job() }).await;
    assert_eq!(response, Response::Submitted { id: "job-1".into() });

    wait_done(&fx.ctx, 1).await;
    let Response::State { state } = roundtrip(&fx.ctx, Request::State).await else {
        panic!("expected State");
    };
    assert_eq!(state.num_total, 1);
    assert_eq!(state.jobs[0].files, vec!["app_linux_amd64.gz"]);
}

#[tokio::test]
async fn rejected_submit_is_an_error_response() {
    let fx = fixture(None).await;
    let response = roundtrip(&fx.ctx, Request::Submit { job: Job::new("example/app", "") }).await;
    assert_eq!(response, Response::error("missing version"));
}

#[tokio::test]
async fn download_returns_finished_artifact() {
    let fx = fixture(None).await;
    roundtrip(&fx.ctx, Request::Submit { job: job() }).await;
    wait_done(&fx.ctx, 1).await;

    let request = Request::Download { id: "job-1".into(), file: "app_linux_amd64.gz".to_string() };
    let Response::Artifact { file, bytes } = roundtrip(&fx.ctx, request).await else {
        panic!("expected Artifact");
    };
    let on_disk = fx.ctx.orchestrator.workspace().job_dir(&"job-1".into()).join("app_linux_amd64.gz");
    assert_eq!(file, "app_linux_amd64.gz");
    assert_eq!(bytes, std::fs::read(on_disk).unwrap());
}

#[tokio::test]
async fn download_failures_are_error_responses() {
    let fx = fixture(None).await;
    roundtrip(&fx.ctx, Request::Submit { job: job() }).await;
    wait_done(&fx.ctx, 1).await;

    let cases = [
        ("job-1", "app_darwin_amd64.gz"),
        ("job-9", "app_linux_amd64.gz"),
        ("job-1", "../../etc/passwd"),
        ("..", "builds"),
    ];
    for (id, file) in cases {
        let request = Request::Download { id: id.into(), file: file.to_string() };
        let Response::Error { message } = roundtrip(&fx.ctx, request).await else {
            panic!("expected Error for {}/{}", id, file);
        };
        assert!(message.starts_with("Download failed"), "{}", message);
    }
}

#[tokio::test]
async fn configured_releaser_is_applied_to_submissions() {
    let fx = fixture(Some("fake")).await;
    roundtrip(&fx.ctx, Request::Submit { job: job() }).await;
    wait_done(&fx.ctx, 1).await;

    assert_eq!(fx.host.setups().len(), 1);
    assert_eq!(fx.host.uploads().len(), 1);
}

#[tokio::test]
async fn subscribe_streams_until_client_leaves() {
    let fx = fixture(None).await;
    let (client, server) = tokio::io::duplex(64 * 1024);
    let ctx = Arc::clone(&fx.ctx);
    let handle = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server);
        handle_connection(reader, writer, &ctx).await
    });
    let (mut reader, mut writer) = tokio::io::split(client);
    wire::write_request(&mut writer, &Request::Subscribe, TIMEOUT).await.unwrap();

    let first = wire::read_response(&mut reader, TIMEOUT).await.unwrap();
    assert!(matches!(first, Response::State { ref state } if state.num_total == 0));

    fx.ctx.orchestrator.submit(job()).unwrap();
    loop {
        let Response::State { state } = wire::read_response(&mut reader, TIMEOUT).await.unwrap() else {
            panic!("expected State");
        };
        if state.num_done == 1 {
            break;
        }
    }

    drop(reader);
    drop(writer);
    tokio::time::timeout(TIMEOUT, handle).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn garbage_request_is_a_protocol_error() {
    let fx = fixture(None).await;
    let (client, server) = tokio::io::duplex(1024);
    let ctx = Arc::clone(&fx.ctx);
    let handle = tokio::spawn(async move {
        let (reader, writer) = tokio::io::split(server);
        handle_connection(reader, writer, &ctx).await
    });
    let (_reader, mut writer) = tokio::io::split(client);
    wire::write_message(&mut writer, b"{\"type\":\"Nope\"}").await.unwrap();

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, ConnectionError::Protocol(ProtocolError::Json(_))));
}
