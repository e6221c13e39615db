// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity and ID generation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Number of random bytes behind a generated job ID (hex-encoded to 12 chars).
const ID_BYTES: usize = 6;

/// Placeholder handed out when the OS random source is unavailable.
///
/// Collisions on this value only make jobs harder to tell apart; the queue
/// and pipeline never key anything on ID uniqueness besides the build
/// directory, which is created with `create_dir_all`.
pub const FALLBACK_ID: &str = "000000000000";

/// Opaque identifier assigned to a job at admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random ID, degrading to [`FALLBACK_ID`] if randomness fails.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        match getrandom::fill(&mut bytes) {
            Ok(()) => Self(hex::encode(bytes)),
            Err(_) => Self(FALLBACK_ID.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for JobId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for JobId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Source of job identities.
pub trait IdGen: Send + Sync {
    fn next(&self) -> JobId;
}

/// Random 12-hex-char IDs from the OS random source.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn next(&self) -> JobId {
        JobId::random()
    }
}

/// Predictable IDs (`{prefix}-1`, `{prefix}-2`, ...) shared across clones.
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<Mutex<u64>>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), counter: Arc::new(Mutex::new(0)) }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> JobId {
        let mut counter = self.counter.lock();
        *counter += 1;
        JobId(format!("{}-{}", self.prefix, *counter))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
