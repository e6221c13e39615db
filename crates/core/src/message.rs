// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server log message.

use serde::{Deserialize, Serialize};

/// One line of the server log, numbered from 1 in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub id: u64,
    pub time_ms: u64,
    pub message: String,
}

impl LogMessage {
    /// Key under which the message is stored in the log map.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}
