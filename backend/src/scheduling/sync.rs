//! Sync reconciler: canonical deltas, the caller-side projection, and the
//! periodic full refresh.
//!
//! Every mutating operation returns a [`CanonicalDelta`] holding the stored
//! state of each row it wrote. Callers keeping a [`LocalProjection`] replace
//! those rows with [`LocalProjection::apply_delta`] instead of recomputing
//! counts themselves. A [`SyncPoller`] independently merges a full read into
//! the projection on a fixed interval to repair drift from lost responses.

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::error::SchedulingResult;
use crate::db::repo_config::SchedulingSettings;
use crate::models::{
    DateGroup, DateRange, Registration, RegistrationId, RegistrationWindow, Session, SessionKey,
};

/// Canonical post-commit state of every row a mutation touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<RegistrationWindow>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub registrations: Vec<Registration>,
}

impl CanonicalDelta {
    pub fn is_empty(&self) -> bool {
        self.window.is_none() && self.sessions.is_empty() && self.registrations.is_empty()
    }

    /// Fold a later delta into this one; rows in `other` win.
    pub fn merge(&mut self, other: CanonicalDelta) {
        if other.window.is_some() {
            self.window = other.window;
        }
        for session in other.sessions {
            let key = session.key();
            self.sessions.retain(|s| s.key() != key);
            self.sessions.push(session);
        }
        for registration in other.registrations {
            self.registrations.retain(|r| r.id != registration.id);
            self.registrations.push(registration);
        }
        self.sessions.sort_by_key(Session::key);
        self.registrations.sort_by_key(|r| r.id);
    }

    pub fn session(&self, key: SessionKey) -> Option<&Session> {
        self.sessions.iter().find(|s| s.key() == key)
    }

    pub fn registration(&self, id: RegistrationId) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }
}

/// Full read of the scheduling state. The window has auto-close applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingSnapshot {
    pub window: RegistrationWindow,
    pub sessions: Vec<Session>,
    pub registrations: Vec<Registration>,
}

/// Caller-held copy of scheduling state.
#[derive(Debug, Clone, Default)]
pub struct LocalProjection {
    window: Option<RegistrationWindow>,
    sessions: BTreeMap<SessionKey, Session>,
    registrations: BTreeMap<RegistrationId, Registration>,
}

impl LocalProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows named in `delta`.
    ///
    /// A row older than the one already held is ignored, so a slow response
    /// arriving after a newer refresh cannot roll the projection back.
    pub fn apply_delta(&mut self, delta: &CanonicalDelta) {
        if let Some(window) = &delta.window {
            let stale = self
                .window
                .as_ref()
                .is_some_and(|held| held.version > window.version);
            if !stale {
                self.window = Some(window.clone());
            }
        }
        for session in &delta.sessions {
            let key = session.key();
            let stale = self
                .sessions
                .get(&key)
                .is_some_and(|held| held.version > session.version);
            if !stale {
                self.sessions.insert(key, session.clone());
            }
        }
        for registration in &delta.registrations {
            let stale = self
                .registrations
                .get(&registration.id)
                .is_some_and(|held| held.version > registration.version);
            if !stale {
                self.registrations.insert(registration.id, registration.clone());
            }
        }
    }

    /// Merge a full read into the projection.
    ///
    /// The same version gate as [`apply_delta`](Self::apply_delta) applies:
    /// a snapshot read before a mutation committed but applied after its
    /// delta keeps the newer row. Rows the snapshot lacks are kept, since
    /// storage never deletes sessions or registrations.
    pub fn merge_snapshot(&mut self, snapshot: SchedulingSnapshot) {
        self.apply_delta(&CanonicalDelta {
            window: Some(snapshot.window),
            sessions: snapshot.sessions,
            registrations: snapshot.registrations,
        });
    }

    pub fn window(&self) -> Option<&RegistrationWindow> {
        self.window.as_ref()
    }

    pub fn session(&self, key: SessionKey) -> Option<&Session> {
        self.sessions.get(&key)
    }

    pub fn registration(&self, id: RegistrationId) -> Option<&Registration> {
        self.registrations.get(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn date_groups(&self, range: Option<DateRange>) -> Vec<DateGroup> {
        let mut groups: Vec<DateGroup> = Vec::new();
        for session in self.sessions.values() {
            if range.is_some_and(|r| !r.contains(session.date)) {
                continue;
            }
            match groups.last_mut() {
                Some(group) if group.date == session.date => group.sessions.push(session.clone()),
                _ => groups.push(DateGroup {
                    date: session.date,
                    sessions: vec![session.clone()],
                }),
            }
        }
        groups
    }
}

/// Anything that can produce a full read of the authoritative state.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> SchedulingResult<SchedulingSnapshot>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct SyncCounters {
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Periodic read-only refresh of a [`LocalProjection`].
pub struct SyncPoller;

impl SyncPoller {
    /// Start a poller on the `[scheduling]` cadence: `sync_interval_secs`
    /// between refreshes, each bounded by `operation_timeout_ms`.
    pub fn from_settings(
        source: Arc<dyn SnapshotSource>,
        projection: Arc<RwLock<LocalProjection>>,
        settings: &SchedulingSettings,
    ) -> SyncHandle {
        Self::start(
            source,
            projection,
            settings.sync_interval(),
            settings.operation_timeout(),
        )
    }

    /// Spawn the refresh loop on the current tokio runtime.
    ///
    /// The first refresh runs immediately. Each refresh is bounded by
    /// `timeout`; a failed or timed-out refresh is logged and counted, and the
    /// projection is left as it was.
    pub fn start(
        source: Arc<dyn SnapshotSource>,
        projection: Arc<RwLock<LocalProjection>>,
        interval: Duration,
        timeout: Duration,
    ) -> SyncHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let counters = Arc::new(SyncCounters::default());
        let task_counters = Arc::clone(&counters);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match tokio::time::timeout(timeout, source.snapshot()).await {
                            Ok(Ok(snapshot)) => {
                                debug!(
                                    "Sync refresh: {} sessions, {} registrations",
                                    snapshot.sessions.len(),
                                    snapshot.registrations.len()
                                );
                                projection.write().merge_snapshot(snapshot);
                                task_counters.successes.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(Err(err)) => {
                                task_counters.failures.fetch_add(1, Ordering::Relaxed);
                                warn!("Sync refresh failed: {}", err);
                            }
                            Err(_) => {
                                task_counters.failures.fetch_add(1, Ordering::Relaxed);
                                warn!("Sync refresh timed out after {:?}", timeout);
                            }
                        }
                    }
                }
            }
            debug!("Sync poller stopped");
        });

        SyncHandle {
            stop_tx,
            join: Some(join),
            counters,
        }
    }
}

/// Control handle for a running [`SyncPoller`].
pub struct SyncHandle {
    stop_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
    counters: Arc<SyncCounters>,
}

impl SyncHandle {
    /// Ask the loop to exit after any in-flight refresh and wait for it.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    /// Abort the loop immediately, dropping any in-flight refresh.
    pub fn cancel(mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            successes: self.counters.successes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
