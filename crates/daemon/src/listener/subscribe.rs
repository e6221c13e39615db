// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming state to subscribers.

use std::io::ErrorKind;

use gox_wire::{self as wire, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::{detect_client_disconnect, state_response, ConnectionError, ListenCtx};
use crate::env::ipc_timeout;

/// Send the current state, then every published snapshot, until the client
/// goes away or the daemon stops publishing.
pub(super) async fn stream_state<R, W>(mut reader: R, mut writer: W, ctx: &ListenCtx) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut updates = ctx.orchestrator.subscribe();
    let disconnected = detect_client_disconnect(&mut reader);
    tokio::pin!(disconnected);

    loop {
        let snapshot = (**updates.borrow_and_update()).clone();
        match wire::write_response(&mut writer, &state_response(snapshot), ipc_timeout()).await {
            Ok(()) => {}
            Err(ProtocolError::Io(e)) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::ConnectionReset) => {
                debug!("subscriber disconnected");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    debug!("state publisher closed, ending subscription");
                    return Ok(());
                }
            }
            _ = &mut disconnected => {
                debug!("subscriber disconnected");
                return Ok(());
            }
        }
    }
}
