//! List cache: materialized collections keyed by query shape.
//!
//! Callers cache "all pages", "pages by tag", "pages by author" and similar
//! list-shaped results here. Invalidation is always a full-namespace sweep:
//! lists are cheap to recompute and expensive to patch incrementally.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::config::CacheConfig;
use super::keys::list_key;
use super::lock::{rw_read, rw_write};
use super::store::CacheStore;

const SOURCE: &str = "cache::list";
const CACHE_LABEL: &str = "list";

pub struct ListCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    /// Keys this component created, for bulk sweep. Also the atomicity
    /// boundary: readers hold the read half, sweeps the write half.
    keys: RwLock<BTreeSet<String>>,
}

impl ListCache {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            config,
            store,
            keys: RwLock::new(BTreeSet::new()),
        }
    }

    /// Cache a list under `key`, normalized into the `list:` namespace.
    pub fn add<T: Serialize>(&self, key: &str, items: &[T]) {
        if !self.config.enabled {
            return;
        }

        let value = match serde_json::to_value(items) {
            Ok(value) => value,
            Err(err) => {
                debug!(key, error = %err, "List entry not cacheable; skipping");
                return;
            }
        };

        let key = list_key(key);
        let mut keys = rw_write(&self.keys, SOURCE, "add");
        self.store.set(&key, value, None);
        keys.insert(key.clone());

        info!(key, "ListCache: added entry");
    }

    /// Fetch a cached list, or miss if absent, swept, or caching is disabled.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        if !self.config.enabled {
            return None;
        }

        let key = list_key(key);
        let value = {
            let keys = rw_read(&self.keys, SOURCE, "get");
            if !keys.contains(&key) {
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                return None;
            }
            self.store.get(&key)
        };

        match value.and_then(|value| serde_json::from_value(value).ok()) {
            Some(items) => {
                counter!("foliant_cache_hit_total", "cache" => CACHE_LABEL).increment(1);
                Some(items)
            }
            None => {
                // The store expired or evicted the entry behind our back;
                // drop the tracked key so bookkeeping stays in step.
                let mut keys = rw_write(&self.keys, SOURCE, "get");
                keys.remove(&key);
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                None
            }
        }
    }

    /// Remove one entry. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) {
        if !self.config.enabled {
            return;
        }

        let key = list_key(key);
        let mut keys = rw_write(&self.keys, SOURCE, "remove");
        self.store.remove(&key);
        keys.remove(&key);

        info!(key, "ListCache: removed entry");
    }

    /// Sweep the whole `list:` namespace. Atomic to concurrent readers: a
    /// reader sees either the full pre-sweep key set or none of it.
    pub fn remove_all(&self) {
        if !self.config.enabled {
            return;
        }

        let mut keys = rw_write(&self.keys, SOURCE, "remove_all");
        for key in keys.iter() {
            self.store.remove(key);
        }
        let removed = keys.len();
        keys.clear();

        counter!("foliant_cache_sweep_total", "cache" => CACHE_LABEL).increment(1);
        info!(removed, "ListCache: swept namespace");
    }

    /// Keys currently tracked by this component, sorted.
    pub fn all_keys(&self) -> Vec<String> {
        rw_read(&self.keys, SOURCE, "all_keys")
            .iter()
            .cloned()
            .collect()
    }
}
