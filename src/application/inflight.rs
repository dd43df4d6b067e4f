//! Per-key registry that serializes upstream refreshes for the same cache key.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default, Clone)]
pub struct InFlightFetches {
    keys: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl InFlightFetches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `key`, then holds it until the guard drops.
    pub async fn acquire(&self, key: &str) -> FetchGuard {
        let lock = Arc::clone(self.keys.entry(key.to_owned()).or_default().value());

        let (guard, waited) = match Arc::clone(&lock).try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => (lock.lock_owned().await, true),
        };

        FetchGuard {
            key: key.to_owned(),
            keys: Arc::clone(&self.keys),
            waited,
            _guard: guard,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.keys.len()
    }
}

pub struct FetchGuard {
    key: String,
    keys: Arc<DashMap<String, Arc<Mutex<()>>>>,
    waited: bool,
    _guard: OwnedMutexGuard<()>,
}

impl FetchGuard {
    /// True when another caller held the key first.
    pub fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        // The map and this guard each own one handle; more means someone is queued.
        self.keys
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}
