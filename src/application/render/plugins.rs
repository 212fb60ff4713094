//! Text plugin hooks.
//!
//! Plugins transform text at two points: before markup conversion (raw
//! markup in, raw markup out) and after token substitution (HTML in, HTML
//! out). A failing plugin is skipped with its input passed through
//! unchanged; one bad plugin never takes a page render down.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::cache::{HookStage, SiteCache};

use super::types::PageReference;

#[derive(Debug, Error)]
#[error("plugin failed: {message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A content transformation hooked into the render pipeline.
pub trait TextPlugin: Send + Sync {
    /// Stable identifier, used for cache keys and settings snapshots.
    fn id(&self) -> &str;

    /// Transform raw markup before conversion.
    fn before_parse(&self, reference: &PageReference, markup: &str)
    -> Result<String, PluginError>;

    /// Transform HTML after sanitization and token substitution.
    fn after_parse(&self, reference: &PageReference, html: &str) -> Result<String, PluginError>;

    /// Current plugin configuration, published to the site cache so other
    /// consumers can read it without reaching into the plugin.
    fn settings_snapshot(&self) -> Option<Value> {
        None
    }
}

/// Runs the registered plugins for one hook stage, in registration order.
pub struct PluginRunner {
    plugins: Vec<Arc<dyn TextPlugin>>,
    site: Option<Arc<SiteCache>>,
    cache_output: bool,
}

impl PluginRunner {
    pub fn new(
        plugins: Vec<Arc<dyn TextPlugin>>,
        site: Option<Arc<SiteCache>>,
        cache_output: bool,
    ) -> Self {
        Self {
            plugins,
            site,
            cache_output,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Publish every plugin's settings snapshot to the site cache.
    pub fn publish_settings(&self) {
        let Some(site) = &self.site else {
            return;
        };
        for plugin in &self.plugins {
            if let Some(snapshot) = plugin.settings_snapshot() {
                site.update_plugin_settings(plugin.id(), snapshot);
            }
        }
    }

    /// Run every plugin for `stage`, threading the text through each one.
    pub fn run(&self, stage: HookStage, reference: &PageReference, text: &str) -> String {
        let mut current = text.to_string();
        for plugin in &self.plugins {
            current = self.run_one(plugin.as_ref(), stage, reference, current);
        }
        current
    }

    fn run_one(
        &self,
        plugin: &dyn TextPlugin,
        stage: HookStage,
        reference: &PageReference,
        input: String,
    ) -> String {
        if let Some(cached) = self.cached_output(plugin, stage, reference) {
            return cached;
        }

        let result = match stage {
            HookStage::BeforeParse => plugin.before_parse(reference, &input),
            HookStage::AfterParse => plugin.after_parse(reference, &input),
        };

        match result {
            Ok(output) => {
                self.store_output(plugin, stage, reference, &output);
                output
            }
            Err(err) => {
                counter!("foliant_plugin_failure_total", "plugin" => plugin.id().to_string())
                    .increment(1);
                warn!(
                    plugin = plugin.id(),
                    page_id = reference.page_id,
                    version = reference.version_number,
                    stage = ?stage,
                    error = %err,
                    "Plugin failed; passing input through"
                );
                input
            }
        }
    }

    // Output is only cached for fixed versions: their text never changes, so
    // the cached hook output stays valid until evicted.
    fn cached_output(
        &self,
        plugin: &dyn TextPlugin,
        stage: HookStage,
        reference: &PageReference,
    ) -> Option<String> {
        if !self.cache_output || !reference.is_fixed_version() {
            return None;
        }
        self.site.as_ref()?.get_plugin_output(
            plugin.id(),
            reference.page_id,
            reference.version_number,
            stage,
        )
    }

    fn store_output(
        &self,
        plugin: &dyn TextPlugin,
        stage: HookStage,
        reference: &PageReference,
        output: &str,
    ) {
        if !self.cache_output || !reference.is_fixed_version() {
            return;
        }
        if let Some(site) = &self.site {
            site.add_plugin_output(
                plugin.id(),
                reference.page_id,
                reference.version_number,
                stage,
                output.to_string(),
            );
        }
    }
}
