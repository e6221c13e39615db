// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gox_core::JobId;
use gox_engine::ServerState;
use serde::{Deserialize, Serialize};

use crate::ServerConfig;

/// Response from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Job accepted into the queue
    Submitted { id: JobId },

    /// Request rejected or failed
    Error { message: String },

    /// State snapshot
    State { state: Box<ServerState> },

    /// Server configuration
    Config { config: ServerConfig },

    /// Artifact contents, hex encoded on the wire
    Artifact {
        file: String,
        #[serde(with = "hex::serde")]
        bytes: Vec<u8>,
    },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }
}
