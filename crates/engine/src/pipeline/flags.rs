// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linker flags.

use std::collections::BTreeMap;

use gox_core::Job;

/// Always injected as `1` so binaries can tell they were built here.
pub const MARKER_VAR: &str = "main.CLOUD_GOX";

/// Injected as the build's unix time in seconds.
pub const BUILD_TIME_VAR: &str = "main.BUILD_TIME";

/// Link-time variables for one job: the caller's variables, then the
/// resolved commit, the label and the build markers, later entries winning.
///
/// The job itself is left untouched.
pub(super) fn link_variables(
    job: &Job,
    commit: Option<&str>,
    build_time_secs: u64,
) -> BTreeMap<String, String> {
    let mut vars: BTreeMap<String, String> =
        job.variables.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    if let Some(commit) = commit {
        vars.insert(job.commit_var.clone(), commit.to_string());
    }
    if !job.label.is_empty() {
        vars.insert(job.label_var.clone(), job.label.clone());
    }
    vars.insert(MARKER_VAR.to_string(), "1".to_string());
    vars.insert(BUILD_TIME_VAR.to_string(), build_time_secs.to_string());
    vars
}

/// Value of `go build -ldflags`.
pub(super) fn ldflags(shrink: bool, vars: &BTreeMap<String, String>) -> String {
    let mut flags = Vec::with_capacity(vars.len() + 2);
    if shrink {
        flags.push("-s".to_string());
        flags.push("-w".to_string());
    }
    flags.extend(vars.iter().map(|(k, v)| format!("-X {}={}", k, v)));
    flags.join(" ")
}
