// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gox_core::Platforms;
use serde::{Deserialize, Serialize};

/// Static facts about the build host, gathered once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Daemon version
    pub version: String,
    /// Resolved path of the Go toolchain binary
    pub bin: String,
    pub os: String,
    pub arch: String,
    pub num_cpu: usize,
    /// Every platform the toolchain can target, all disabled
    pub platforms: Platforms,
    /// Output of `go version`
    pub bin_version: String,
}
