// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity ring buffer of server log messages.
//!
//! Messages are keyed by their decimal ID so observers can diff snapshots
//! by key. `log_offset` is always the ID of the oldest retained message,
//! i.e. the next one to be evicted once the buffer is full.

use gox_core::LogMessage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of messages retained.
pub const MAX_LOG_SIZE: usize = 500;

fn default_capacity() -> usize {
    MAX_LOG_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBuffer {
    pub log_offset: u64,
    pub log_count: usize,
    pub log: HashMap<String, LogMessage>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LOG_SIZE)
    }
}

impl LogBuffer {
    /// Zero capacity is treated as one; the buffer always keeps the latest line.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { log_offset: 1, log_count: 0, log: HashMap::new(), capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Insert a message, evicting the oldest when at capacity.
    ///
    /// Callers must push messages with consecutive IDs starting at 1.
    pub fn push(&mut self, message: LogMessage) {
        if self.log_count == self.capacity {
            self.log.remove(&self.log_offset.to_string());
            self.log_offset += 1;
        } else {
            self.log_count += 1;
        }
        self.log.insert(message.key(), message);
    }

    pub fn get(&self, id: u64) -> Option<&LogMessage> {
        self.log.get(&id.to_string())
    }

    /// Retained messages, oldest first.
    pub fn messages(&self) -> Vec<&LogMessage> {
        let mut messages: Vec<&LogMessage> = self.log.values().collect();
        messages.sort_by_key(|m| m.id);
        messages
    }
}

#[cfg(test)]
#[path = "log_buffer_tests.rs"]
mod tests;
