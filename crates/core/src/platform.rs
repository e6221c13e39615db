// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS/architecture targets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Matrix of OS → architecture → enabled.
pub type Platforms = BTreeMap<String, BTreeMap<String, bool>>;

/// Flatten the enabled cells of a platform matrix into `os/arch` strings.
///
/// Ordering follows the map ordering (OS, then architecture).
pub fn flatten_platforms(platforms: &Platforms) -> Vec<String> {
    platforms
        .iter()
        .flat_map(|(os, arches)| {
            arches.iter().filter(|(_, on)| **on).map(move |(arch, _)| format!("{}/{}", os, arch))
        })
        .collect()
}

/// Build a platform matrix from `os/arch` lines (e.g. `go tool dist list`).
///
/// Every parsed pair is present but disabled; malformed lines are ignored.
pub fn platforms_from_list(list: &str) -> Platforms {
    let mut platforms = Platforms::new();
    for line in list.lines() {
        if let Some(pair) = OsArch::parse(line.trim()) {
            platforms.entry(pair.os).or_default().insert(pair.arch, false);
        }
    }
    platforms
}

/// One `os/arch` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OsArch {
    pub os: String,
    pub arch: String,
}

impl OsArch {
    /// Parse `os/arch`. Both halves must be non-empty and the architecture
    /// may not contain another separator.
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('/')?;
        if os.is_empty() || arch.is_empty() || arch.contains('/') {
            return None;
        }
        Some(Self { os: os.to_string(), arch: arch.to_string() })
    }

    /// Output binary name for `target` on this platform, before compression.
    pub fn binary_name(&self, target: &str) -> String {
        let mut name = format!("{}_{}_{}", target, self.os, self.arch);
        if self.os == "windows" {
            name.push_str(".exe");
        }
        name
    }
}

impl fmt::Display for OsArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
