//! Page view cache: rendered views keyed by (page id, version).
//!
//! Version 0 is the latest-sentinel. Any mutation that changes which version
//! is latest must invalidate the sentinel entry for that page id, whether or
//! not the fixed-version entry is also touched. Point entries are removed
//! surgically because the affected key set is always known exactly.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use metrics::counter;
use tracing::{debug, info};

use crate::domain::views::PageView;

use super::config::CacheConfig;
use super::keys::{homepage_key, page_view_key, page_view_prefix};
use super::lock::{rw_read, rw_write};
use super::store::CacheStore;

const SOURCE: &str = "cache::page_view";
const CACHE_LABEL: &str = "page_view";

pub struct PageViewCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    keys: RwLock<BTreeSet<String>>,
    /// Moves on every invalidation; guarded writes compare against it.
    generation: AtomicU64,
}

impl PageViewCache {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            config,
            store,
            keys: RwLock::new(BTreeSet::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current invalidation stamp. Capture before loading content, then pass
    /// to [`Self::add_guarded`] so a slow render cannot write back a view
    /// that an invalidation in between already declared stale.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cache a rendered view under (page id, version). Pass
    /// [`crate::domain::entities::LATEST_VERSION`] to populate the
    /// latest-sentinel entry.
    pub fn add(&self, page_id: i64, version_number: u32, view: &PageView) {
        self.put(page_view_key(page_id, version_number), view, None);
    }

    /// Like [`Self::add`], but dropped when any invalidation ran since
    /// `observed` was captured. Returns whether the entry was stored.
    pub fn add_guarded(
        &self,
        page_id: i64,
        version_number: u32,
        view: &PageView,
        observed: u64,
    ) -> bool {
        self.put(page_view_key(page_id, version_number), view, Some(observed))
    }

    pub fn get(&self, page_id: i64, version_number: u32) -> Option<PageView> {
        self.fetch(&page_view_key(page_id, version_number))
    }

    /// Cache the homepage-designated view.
    pub fn add_homepage(&self, view: &PageView) {
        self.put(homepage_key(), view, None);
    }

    /// Guarded variant of [`Self::add_homepage`].
    pub fn add_homepage_guarded(&self, view: &PageView, observed: u64) -> bool {
        self.put(homepage_key(), view, Some(observed))
    }

    pub fn get_homepage(&self) -> Option<PageView> {
        self.fetch(&homepage_key())
    }

    pub fn remove_homepage(&self) {
        if !self.config.enabled {
            return;
        }

        let key = homepage_key();
        let mut keys = rw_write(&self.keys, SOURCE, "remove_homepage");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.remove(&key);
        keys.remove(&key);

        info!("PageViewCache: removed homepage entry");
    }

    /// Remove the entry for one (page id, version) pair.
    pub fn remove(&self, page_id: i64, version_number: u32) {
        if !self.config.enabled {
            return;
        }

        let key = page_view_key(page_id, version_number);
        let mut keys = rw_write(&self.keys, SOURCE, "remove");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.remove(&key);
        keys.remove(&key);

        info!(key, "PageViewCache: removed entry");
    }

    /// Remove every cached version of one page, the latest-sentinel included.
    pub fn remove_page(&self, page_id: i64) {
        if !self.config.enabled {
            return;
        }

        let prefix = page_view_prefix(page_id);
        let mut keys = rw_write(&self.keys, SOURCE, "remove_page");
        self.generation.fetch_add(1, Ordering::SeqCst);
        let page_keys: Vec<String> = keys
            .iter()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in &page_keys {
            self.store.remove(key);
            keys.remove(key);
        }

        counter!("foliant_cache_sweep_total", "cache" => CACHE_LABEL).increment(1);
        info!(page_id, removed = page_keys.len(), "PageViewCache: removed page entries");
    }

    /// Sweep the whole `page:` namespace.
    pub fn remove_all(&self) {
        if !self.config.enabled {
            return;
        }

        let mut keys = rw_write(&self.keys, SOURCE, "remove_all");
        self.generation.fetch_add(1, Ordering::SeqCst);
        for key in keys.iter() {
            self.store.remove(key);
        }
        let removed = keys.len();
        keys.clear();

        counter!("foliant_cache_sweep_total", "cache" => CACHE_LABEL).increment(1);
        info!(removed, "PageViewCache: swept namespace");
    }

    pub fn all_keys(&self) -> Vec<String> {
        rw_read(&self.keys, SOURCE, "all_keys")
            .iter()
            .cloned()
            .collect()
    }

    fn put(&self, key: String, view: &PageView, observed: Option<u64>) -> bool {
        if !self.config.enabled {
            return false;
        }

        let value = match serde_json::to_value(view) {
            Ok(value) => value,
            Err(_) => return false,
        };

        let mut keys = rw_write(&self.keys, SOURCE, "put");
        if let Some(observed) = observed {
            // The stamp moves under the same write lock, so an equal value
            // here means no invalidation slipped in since it was captured.
            if self.generation.load(Ordering::SeqCst) != observed {
                debug!(key, "PageViewCache: dropped write-back overtaken by invalidation");
                return false;
            }
        }
        self.store.set(&key, value, self.config.page_view_ttl);
        keys.insert(key.clone());

        info!(key, "PageViewCache: added entry");
        true
    }

    fn fetch(&self, key: &str) -> Option<PageView> {
        if !self.config.enabled {
            return None;
        }

        let value = {
            let keys = rw_read(&self.keys, SOURCE, "fetch");
            if !keys.contains(key) {
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                return None;
            }
            self.store.get(key)
        };

        match value.and_then(|value| serde_json::from_value(value).ok()) {
            Some(view) => {
                counter!("foliant_cache_hit_total", "cache" => CACHE_LABEL).increment(1);
                Some(view)
            }
            None => {
                // The store expired or evicted the entry behind our back;
                // drop the tracked key so bookkeeping stays in step.
                let mut keys = rw_write(&self.keys, SOURCE, "fetch");
                keys.remove(key);
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                None
            }
        }
    }
}
