// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gox-core: data model for the gox cross-compilation daemon

pub mod macros;

pub mod clock;
pub mod environ;
pub mod id;
pub mod job;
pub mod message;
pub mod platform;

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
pub use clock::{Clock, SystemClock};
pub use environ::Environ;
pub use id::{IdGen, JobId, RandomIdGen, SequentialIdGen, FALLBACK_ID};
pub use job::{Job, JobError, JobPhase, ROOT_TARGET};
pub use message::LogMessage;
pub use platform::{flatten_platforms, platforms_from_list, OsArch, Platforms};
