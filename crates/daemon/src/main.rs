// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! goxd: the gox cross-compilation daemon.

use std::sync::Arc;

use gox_daemon::env;
use gox_daemon::{startup, Config, LifecycleError, ListenCtx, Listener, StartupResult};
use gox_engine::DirectoryReleaseHost;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file_name = config.log_path.file_name().map(|n| n.to_owned()).unwrap_or_else(|| "daemon.log".into());
    let appender = tracing_appender::rolling::never(&config.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let _guard = init_tracing(&config)?;
    info!(state_dir = %config.state_dir.display(), "starting goxd");

    let StartupResult { daemon, listener, tcp } = match startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!("startup failed: {}", e);
            return Err(e);
        }
    };

    let ctx = Arc::new(ListenCtx {
        orchestrator: Arc::clone(&daemon.orchestrator),
        server_config: daemon.server_config.clone(),
        releaser: config.release_dir.as_ref().map(|_| DirectoryReleaseHost::NAME.to_string()),
    });
    let listener = match tcp {
        Some(tcp) => Listener::with_tcp(listener, tcp, ctx),
        None => Listener::new(listener, ctx),
    };
    let listener_task = tokio::spawn(listener.run());

    // Readiness marker for supervisors
    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received interrupt"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }

    listener_task.abort();
    let _ = listener_task.await;
    daemon.shutdown(env::drain_timeout()).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("goxd: {}", e);
        std::process::exit(1);
    }
}
