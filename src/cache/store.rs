//! Cache storage.
//!
//! The engine treats the store as an external capability: atomic single-key
//! get/set/remove over JSON values, with optional expiration and manual
//! eviction. [`MemoryStore`] is the in-process default; a store failure is
//! indistinguishable from a miss, so callers always recompute.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Key/value storage capability consumed by the cache components.
///
/// Implementations must provide atomic single-key operations; the cache
/// components add no locking around them, only around their own key-set
/// bookkeeping and multi-key sweeps.
pub trait CacheStore: Send + Sync {
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>);
    fn get(&self, key: &str) -> Option<Value>;
    fn remove(&self, key: &str);
}

struct StoredEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-process store with LRU eviction and per-entry TTL.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, StoredEntry>>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.entry_limit_non_zero())),
        }
    }

    /// Number of live entries. Expired-but-unswept entries count until the
    /// next access pops them.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let entry = StoredEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
    }

    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.pop(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn remove(&self, key: &str) {
        rw_write(&self.entries, SOURCE, "remove").pop(key);
    }
}
