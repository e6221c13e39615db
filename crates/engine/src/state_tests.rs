// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::OnceLock;

/// Publisher that checks the state lock is free at publish time.
#[derive(Default)]
struct LockProbe {
    state: OnceLock<Arc<Mutex<ServerState>>>,
    published: Mutex<Vec<Arc<ServerState>>>,
    held_during_publish: Mutex<u32>,
}

impl StatePublisher for LockProbe {
    fn publish(&self, snapshot: Arc<ServerState>) {
        if let Some(state) = self.state.get() {
            if state.try_lock().is_none() {
                *self.held_during_publish.lock() += 1;
            }
        }
        self.published.lock().push(snapshot);
    }
}

fn probed() -> (SharedState, Arc<LockProbe>) {
    let probe = Arc::new(LockProbe::default());
    let state = SharedState::new(ServerState::default(), probe.clone());
    let _ = probe.state.set(state.raw());
    (state, probe)
}

#[test]
fn update_publishes_after_releasing_lock() {
    let (state, probe) = probed();
    state.update(|s| s.num_total += 1);
    state.update(|s| s.ready = true);
    state.publish();

    assert_eq!(*probe.held_during_publish.lock(), 0);
    let published = probe.published.lock();
    assert_eq!(published.len(), 3);
    assert_eq!(published[0].num_total, 1);
    assert!(!published[0].ready);
    assert!(published[1].ready);
}

#[test]
fn mutate_does_not_publish() {
    let (state, probe) = probed();
    let total = state.mutate(|s| {
        s.num_total += 1;
        s.num_total
    });
    assert_eq!(total, 1);
    assert!(probe.published.lock().is_empty());
    assert_eq!(state.snapshot().num_total, 1);
}

#[test]
fn sync_job_replaces_history_entry() {
    let (state, _probe) = probed();
    let mut job = Job::new("example/app", "1.0.0");
    job.id = JobId::new("abc");
    state.update(|s| s.jobs.insert(0, job.clone()));

    job.files.push("app_linux_amd64.gz".to_string());
    state.sync_job(&job);

    let snap = state.snapshot();
    assert_eq!(snap.jobs.len(), 1);
    assert_eq!(snap.job(&JobId::new("abc")).unwrap().files, vec!["app_linux_amd64.gz"]);
}

#[test]
fn sync_unknown_job_is_noop() {
    let (state, _probe) = probed();
    let mut job = Job::new("p", "v");
    job.id = JobId::new("ghost");
    state.sync_job(&job);
    assert!(state.snapshot().jobs.is_empty());
}

#[tokio::test]
async fn watch_publisher_delivers_latest_snapshot() {
    let publisher = Arc::new(WatchPublisher::new(ServerState::default()));
    let mut rx = publisher.subscribe();
    let state = SharedState::new(ServerState::default(), publisher.clone());

    state.update(|s| s.num_queued = 3);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().num_queued, 3);
    assert_eq!(publisher.latest().num_queued, 3);
}

#[test]
fn state_json_is_flat() {
    let state = ServerState::with_log_capacity(10);
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["numQueued"], 0);
    assert_eq!(json["logOffset"], 1);
    assert!(json["jobs"].as_array().unwrap().is_empty());
}
