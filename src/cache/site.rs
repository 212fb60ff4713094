//! Site cache: cross-cutting, rarely-changing artifacts.
//!
//! Unlike the list cache this exposes one accessor pair per artifact kind —
//! menu variants, per-plugin settings snapshots, plugin hook output — because
//! each artifact has a fixed, known key derivation.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use metrics::counter;
use serde_json::Value;
use tracing::info;

use super::config::CacheConfig;
use super::keys::{
    HookStage, admin_menu_key, logged_in_menu_key, menu_key, plugin_output_key,
    plugin_settings_key,
};
use super::lock::{rw_read, rw_write};
use super::store::CacheStore;

const SOURCE: &str = "cache::site";
const CACHE_LABEL: &str = "site";

pub struct SiteCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    keys: RwLock<BTreeSet<String>>,
}

impl SiteCache {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            config,
            store,
            keys: RwLock::new(BTreeSet::new()),
        }
    }

    // ========================================================================
    // Navigation menus
    // ========================================================================

    pub fn add_menu(&self, html: String) {
        self.put(menu_key(), Value::String(html));
    }

    pub fn add_logged_in_menu(&self, html: String) {
        self.put(logged_in_menu_key(), Value::String(html));
    }

    pub fn add_admin_menu(&self, html: String) {
        self.put(admin_menu_key(), Value::String(html));
    }

    pub fn get_menu(&self) -> Option<String> {
        self.get_string(&menu_key())
    }

    pub fn get_logged_in_menu(&self) -> Option<String> {
        self.get_string(&logged_in_menu_key())
    }

    pub fn get_admin_menu(&self) -> Option<String> {
        self.get_string(&admin_menu_key())
    }

    /// Clear all three menu variants as one atomic step: a concurrent reader
    /// sees either every variant or none, never a partial clear.
    pub fn remove_menu_items(&self) {
        if !self.config.enabled {
            return;
        }

        let mut keys = rw_write(&self.keys, SOURCE, "remove_menu_items");
        for key in [menu_key(), logged_in_menu_key(), admin_menu_key()] {
            self.store.remove(&key);
            keys.remove(&key);
        }

        counter!("foliant_cache_sweep_total", "cache" => CACHE_LABEL).increment(1);
        info!("SiteCache: removed menu entries");
    }

    // ========================================================================
    // Plugin settings snapshots
    // ========================================================================

    pub fn update_plugin_settings(&self, plugin_id: &str, snapshot: Value) {
        self.put(plugin_settings_key(plugin_id), snapshot);
    }

    pub fn get_plugin_settings(&self, plugin_id: &str) -> Option<Value> {
        self.get_value(&plugin_settings_key(plugin_id))
    }

    pub fn remove_plugin_settings(&self, plugin_id: &str) {
        if !self.config.enabled {
            return;
        }

        let key = plugin_settings_key(plugin_id);
        let mut keys = rw_write(&self.keys, SOURCE, "remove_plugin_settings");
        self.store.remove(&key);
        keys.remove(&key);
    }

    // ========================================================================
    // Plugin hook output
    // ========================================================================

    pub fn add_plugin_output(
        &self,
        plugin_id: &str,
        page_id: i64,
        version_number: u32,
        stage: HookStage,
        output: String,
    ) {
        self.put(
            plugin_output_key(plugin_id, page_id, version_number, stage),
            Value::String(output),
        );
    }

    pub fn get_plugin_output(
        &self,
        plugin_id: &str,
        page_id: i64,
        version_number: u32,
        stage: HookStage,
    ) -> Option<String> {
        self.get_string(&plugin_output_key(plugin_id, page_id, version_number, stage))
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Sweep the whole `site:` namespace.
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
        info!(removed, "SiteCache: swept namespace");
    }

    pub fn all_keys(&self) -> Vec<String> {
        rw_read(&self.keys, SOURCE, "all_keys")
            .iter()
            .cloned()
            .collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn put(&self, key: String, value: Value) {
        if !self.config.enabled {
            return;
        }

        let mut keys = rw_write(&self.keys, SOURCE, "put");
        self.store.set(&key, value, None);
        keys.insert(key);
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }

        let value = {
            let keys = rw_read(&self.keys, SOURCE, "get");
            if !keys.contains(key) {
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                return None;
            }
            self.store.get(key)
        };

        match value {
            Some(value) => {
                counter!("foliant_cache_hit_total", "cache" => CACHE_LABEL).increment(1);
                Some(value)
            }
            None => {
                // Tracked key outlived its store entry; retire it.
                let mut keys = rw_write(&self.keys, SOURCE, "get");
                keys.remove(key);
                counter!("foliant_cache_miss_total", "cache" => CACHE_LABEL).increment(1);
                None
            }
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get_value(key) {
            Some(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}
