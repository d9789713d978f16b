//! In-memory response cache with explicit insertion timestamps

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::ResponseStore;

/// A cached payload and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// Process-local cache, lost when the client is dropped
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of entries held, fresh or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, by: Duration) {
        if let Some(entry) = self.lock().get_mut(key) {
            if let Some(earlier) = entry.stored_at.checked_sub(by) {
                entry.stored_at = earlier;
            }
        }
    }
}

impl ResponseStore for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        let now = Instant::now();

        if entries.get(key)?.is_expired(self.ttl, now) {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.payload.clone())
    }

    fn set(&self, key: &str, payload: &Value) {
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                payload: payload.clone(),
                stored_at: Instant::now(),
            },
        );
    }

    fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    fn clear_expired(&self) -> usize {
        let mut entries = self.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl, now));
        before - entries.len()
    }
}
