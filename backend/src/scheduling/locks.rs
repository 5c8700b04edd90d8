//! Single-writer serialization per `(date, period)`.
//!
//! Every mutation that reads and then changes a session's `booked` count
//! holds that session's lock across the read, the check and the commit.
//! Multi-key operations acquire their keys in ascending order so two
//! operations over overlapping keys cannot deadlock.
//!
//! Entries live only while some caller holds or awaits them, so keys named
//! by requests for sessions that do not exist leave nothing behind.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::SessionKey;

type LockMap = HashMap<SessionKey, Arc<AsyncMutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: SessionKey) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock();
        Arc::clone(map.entry(key).or_default())
    }

    /// Lock every key in `keys`, in key order. Duplicates are collapsed.
    pub async fn acquire(&self, keys: impl IntoIterator<Item = SessionKey>) -> SessionGuards {
        let ordered: BTreeSet<SessionKey> = keys.into_iter().collect();
        // Built up in place so a cancelled acquire still prunes on drop.
        let mut held = SessionGuards {
            guards: Vec::with_capacity(ordered.len()),
            registry: Arc::clone(&self.inner),
        };
        for key in ordered {
            let guard = self.lock_for(key).lock_owned().await;
            held.guards.push((key, guard));
        }
        held
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held session locks; released on drop.
#[derive(Debug)]
pub struct SessionGuards {
    guards: Vec<(SessionKey, OwnedMutexGuard<()>)>,
    registry: Arc<Mutex<LockMap>>,
}

impl SessionGuards {
    pub fn keys(&self) -> Vec<SessionKey> {
        self.guards.iter().map(|(k, _)| *k).collect()
    }

    pub fn holds(&self, key: SessionKey) -> bool {
        self.guards.iter().any(|(k, _)| *k == key)
    }
}

impl Drop for SessionGuards {
    fn drop(&mut self) {
        self.guards.clear();
        // `lock_for` clones under the same map lock, so a count of one means
        // no caller holds or awaits the entry. This also sweeps entries left
        // by acquires cancelled while waiting.
        self.registry
            .lock()
            .retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }
}
