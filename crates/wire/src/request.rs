// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gox_core::{Job, JobId};
use serde::{Deserialize, Serialize};

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Queue a build job
    Submit { job: Job },

    /// Current server state snapshot
    State,

    /// Static server configuration
    Config,

    /// Stream a `State` response on every state change until the client
    /// disconnects
    Subscribe,

    /// Fetch a compressed artifact from a job's build directory
    Download { id: JobId, file: String },
}

impl Request {
    /// Frequent, read-only requests that are logged at debug level.
    pub fn is_poll(&self) -> bool {
        matches!(self, Request::Ping | Request::State | Request::Config)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
