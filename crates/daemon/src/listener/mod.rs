// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and serving
//! one request per connection. `Subscribe` turns the connection into a
//! stream of state snapshots.

mod subscribe;

use std::sync::Arc;

use gox_core::JobId;
use gox_engine::{Orchestrator, ServerState};
use gox_wire::{self as wire, ProtocolError, Request, Response, ServerConfig};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, error, info, warn};

use crate::env::{ipc_timeout, PROTOCOL_VERSION};

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub orchestrator: Arc<Orchestrator>,
    pub server_config: ServerConfig,
    /// Release host applied to every submitted job.
    pub releaser: Option<String>,
}

/// Listener task for accepting socket connections.
pub struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: None, ctx }
    }

    pub fn with_tcp(unix: UnixListener, tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp: Some(tcp), ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(mut self) {
        match self.tcp.take() {
            Some(tcp) => self.run_dual(tcp).await,
            None => self.run_unix_only().await,
        }
    }

    async fn run_unix_only(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let (reader, writer) = stream.into_split();
                    spawn_connection(reader, writer, Arc::clone(&self.ctx));
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener) {
        loop {
            tokio::select! {
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let (reader, writer) = stream.into_split();
                        spawn_connection(reader, writer, Arc::clone(&self.ctx));
                    }
                    Err(e) => error!("Unix accept error: {}", e),
                },
                result = tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!("TCP connection from {}", addr);
                        let (reader, writer) = stream.into_split();
                        spawn_connection(reader, writer, Arc::clone(&self.ctx));
                    }
                    Err(e) => error!("TCP accept error: {}", e),
                },
            }
        }
    }
}

fn spawn_connection<R, W>(reader: R, writer: W, ctx: Arc<ListenCtx>)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = handle_connection(reader, writer, &ctx).await {
            log_connection_error(e);
        }
    });
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("Client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// Generic over reader/writer types so it works with both Unix and TCP streams.
pub(crate) async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = wire::read_request(&mut reader, ipc_timeout()).await?;

    // State and config are polled frequently
    if request.is_poll() {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    if matches!(request, Request::Subscribe) {
        return subscribe::stream_state(reader, writer, ctx).await;
    }

    let response = handle_request(request, ctx).await;
    wire::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                debug!(client = %version, server = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Submit { mut job } => {
            job.releaser = ctx.releaser.clone();
            match ctx.orchestrator.submit(job) {
                Ok(id) => Response::Submitted { id },
                Err(e) => {
                    warn!(error = %e, "job rejected");
                    Response::error(e.to_string())
                }
            }
        }

        // Streaming is set up in handle_connection; here it degrades to one snapshot.
        Request::State | Request::Subscribe => state_response(ctx.orchestrator.snapshot()),

        Request::Config => Response::Config { config: ctx.server_config.clone() },

        Request::Download { id, file } => download(ctx, &id, file).await,
    }
}

/// Read a finished artifact from the job's build directory.
async fn download(ctx: &ListenCtx, id: &JobId, file: String) -> Response {
    let Some(path) = ctx.orchestrator.workspace().artifact(id, &file) else {
        warn!(job_id = %id, file = %file, "download rejected");
        return Response::error(format!("Download failed: invalid artifact {}/{}", id, file));
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => Response::Artifact { file, bytes },
        Err(e) => Response::error(format!("Download failed: {}", e)),
    }
}

fn state_response(state: ServerState) -> Response {
    Response::State { state: Box::new(state) }
}

/// Detect client disconnect by reading from the socket.
///
/// Clients send nothing after their request, so any completed read (EOF,
/// error, or stray bytes) ends the conversation.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
