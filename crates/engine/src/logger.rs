// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server log: a non-blocking writer handle plus the single drain task that
//! numbers messages and moves them into the shared state's ring buffer.

use std::sync::Arc;

use gox_core::{Clock, LogMessage};
use tokio::sync::mpsc;

use crate::state::SharedState;

/// Cheap, clonable writer for server log lines. Never blocks.
#[derive(Clone)]
pub struct Logger {
    tx: mpsc::UnboundedSender<String>,
}

impl Logger {
    /// Create a logger and the receiving end for its [`LogDrain`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a line for the server log.
    ///
    /// Lines written after the drain has stopped are dropped.
    pub fn log(&self, message: impl Into<String>) {
        let _ = self.tx.send(message.into());
    }
}

/// Sole consumer of the log stream.
pub struct LogDrain {
    rx: mpsc::UnboundedReceiver<String>,
    state: SharedState,
    clock: Arc<dyn Clock>,
    next_id: u64,
}

impl LogDrain {
    pub fn new(
        rx: mpsc::UnboundedReceiver<String>,
        state: SharedState,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { rx, state, clock, next_id: 1 }
    }

    /// Drain until every [`Logger`] handle is dropped.
    pub async fn run(mut self) {
        while let Some(line) = self.rx.recv().await {
            self.ingest(line);
        }
        tracing::debug!("log stream closed");
    }

    /// Number, store, and publish one line.
    pub fn ingest(&mut self, line: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let text = line.trim_end();
        tracing::info!(target: "gox::log", id, "{}", text);
        let message = LogMessage { id, time_ms: self.clock.epoch_ms(), message: text.to_string() };
        self.state.update(|s| s.log.push(message));
        id
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
