//! Cache configuration, derived from the `[cache]` settings section.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::CacheSettings;

/// Runtime cache configuration shared by every cache component.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Global toggle. Disabled means writes no-op and reads always miss.
    pub enabled: bool,
    /// Maximum entries in the in-process store before LRU eviction.
    pub entry_limit: usize,
    /// Optional TTL for page view entries.
    pub page_view_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from(&CacheSettings::default())
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            entry_limit: settings.entry_limit,
            page_view_ttl: settings.page_view_ttl_secs.map(Duration::from_secs),
        }
    }
}

impl CacheConfig {
    /// Entry limit as `NonZeroUsize`, clamping zero to 1.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
