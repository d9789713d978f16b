//! Cache module for storing API responses
//!
//! Responses are keyed by a fingerprint of the request and expire after a
//! fixed TTL. The cache is purely an optimization: lookups never fail, and a
//! write that cannot be persisted is dropped with a warning.

mod fingerprint;
mod manager;
mod memory;

pub use fingerprint::generate_key;
pub use manager::CacheManager;
pub use memory::MemoryCache;

use serde_json::Value;

/// Key to payload storage with TTL-based expiry
///
/// Implementations delete stale or unreadable entries as a side effect of
/// `get`, and swallow persistence failures in `set`.
pub trait ResponseStore: Send + Sync {
    /// Returns the payload for `key` if present and no older than the TTL
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `payload` under `key`, replacing any previous entry
    fn set(&self, key: &str, payload: &Value);

    /// Removes every entry, returning how many were removed
    fn clear(&self) -> usize;

    /// Removes only stale entries, returning how many were removed
    fn clear_expired(&self) -> usize;
}
