// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External toolchain invocation (`go`, `git`).
//!
//! The pipeline only depends on the [`Toolchain`] seam. There is no timeout:
//! a hung compiler hangs the worker until an operator restarts
//! the daemon.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use gox_core::Environ;
use thiserror::Error;
use tokio::process::Command;

use crate::logger::Logger;

/// Number of trailing stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 5;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}{}", fmt_stderr(.stderr))]
    Failed { command: String, status: String, stderr: String },
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// One external process call: `<program> <args...>` in `dir` with `env`
/// overlaid on the daemon's environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Environ,
    pub dir: PathBuf,
    /// Skip echoing the command and its output to the server log.
    pub quiet: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, dir: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Environ::new(),
            dir: dir.into(),
            quiet: false,
        }
    }

    pub fn env(mut self, env: Environ) -> Self {
        self.env = env;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// First argument, e.g. `build` for `go build ...`.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Value following `flag` in the argument list.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs toolchain commands. Returns captured stdout on success.
#[async_trait]
pub trait Toolchain: Send + Sync + 'static {
    async fn run(&self, invocation: &Invocation, logger: &Logger) -> Result<String, ToolError>;
}

/// Spawns real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessToolchain;

#[async_trait]
impl Toolchain for ProcessToolchain {
    async fn run(&self, invocation: &Invocation, logger: &Logger) -> Result<String, ToolError> {
        if !invocation.quiet {
            logger.log(format!("exec: {}", invocation));
            tracing::debug!(command = %invocation, dir = %invocation.dir.display(), "running tool");
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.dir)
            .envs(invocation.env.iter())
            .stdin(Stdio::null());
        let output = cmd.output().await.map_err(|source| ToolError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !invocation.quiet {
            for line in stdout.lines().chain(stderr.lines()).filter(|l| !l.trim().is_empty()) {
                logger.log(line.to_string());
            }
        }

        if !output.status.success() {
            let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(ToolError::Failed {
                command: invocation.to_string(),
                status: output.status.to_string(),
                stderr: tail,
            });
        }
        Ok(stdout)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Invocation, Logger, ToolError, Toolchain};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    type Rule = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

    /// Output of the fake `git rev-parse`.
    pub const FAKE_COMMIT: &str = "abc1234";

    /// Contents written as the fake compiled binary.
    pub const FAKE_BINARY: &[u8] = b"\x7fELF fake binary";

    #[derive(Default)]
    struct FakeToolchainState {
        calls: Vec<Invocation>,
        failures: Vec<Rule>,
    }

    /// Toolchain double that records every invocation.
    ///
    /// `build` writes [`FAKE_BINARY`] to the `-o` path and `get <pkg>` creates
    /// `$GOPATH/src/<pkg>`, so the pipeline sees the same filesystem effects
    /// as with the real tools. Rules added with [`fail_if`](Self::fail_if)
    /// turn matching calls into failures.
    #[derive(Clone, Default)]
    pub struct FakeToolchain {
        inner: Arc<Mutex<FakeToolchainState>>,
    }

    impl FakeToolchain {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_if(&self, rule: impl Fn(&Invocation) -> bool + Send + Sync + 'static) {
            self.inner.lock().failures.push(Box::new(rule));
        }

        /// Fail every call whose first argument is `subcommand`.
        pub fn fail_subcommand(&self, subcommand: &'static str) {
            self.fail_if(move |inv| inv.subcommand() == Some(subcommand));
        }

        /// Fail `build` calls targeting the given GOOS.
        pub fn fail_build_for_os(&self, os: &'static str) {
            self.fail_if(move |inv| inv.subcommand() == Some("build") && inv.env.get("GOOS") == Some(os));
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_for(&self, subcommand: &str) -> Vec<Invocation> {
            self.calls().into_iter().filter(|c| c.subcommand() == Some(subcommand)).collect()
        }
    }

    #[async_trait]
    impl Toolchain for FakeToolchain {
        async fn run(&self, invocation: &Invocation, _logger: &Logger) -> Result<String, ToolError> {
            let failed = {
                let mut inner = self.inner.lock();
                inner.calls.push(invocation.clone());
                inner.failures.iter().any(|rule| rule(invocation))
            };
            if failed {
                return Err(ToolError::Failed {
                    command: invocation.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "fake failure".to_string(),
                });
            }

            let io_err = |source| ToolError::Spawn { program: invocation.program.clone(), source };
            match invocation.subcommand() {
                Some("build") => {
                    if let Some(out) = invocation.flag_value("-o") {
                        std::fs::write(out, FAKE_BINARY).map_err(io_err)?;
                    }
                    Ok(String::new())
                }
                Some("get") => {
                    let package = invocation.args.last().cloned().unwrap_or_default();
                    let gopath = invocation.env.get("GOPATH");
                    if let Some(gopath) = gopath.filter(|_| package != ".") {
                        let dir = PathBuf::from(gopath).join("src").join(package);
                        std::fs::create_dir_all(dir).map_err(io_err)?;
                    }
                    Ok(String::new())
                }
                Some("rev-parse") => Ok(format!("{}\n", FAKE_COMMIT)),
                _ => Ok(String::new()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeToolchain, FAKE_BINARY, FAKE_COMMIT};

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
