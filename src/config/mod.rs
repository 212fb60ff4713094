//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const ENV_PREFIX: &str = "FOLIANT";
const ENV_SEPARATOR: &str = "__";

const DEFAULT_ATTACHMENTS_URL_PATH: &str = "/Attachments";
const DEFAULT_HOMEPAGE_TAG: &str = "homepage";
const DEFAULT_CACHE_ENTRY_LIMIT: usize = 2000;

/// Tags stripped from rendered output unless explicitly re-allowed.
pub const DEFAULT_DENIED_TAGS: &[&str] = &[
    "script", "iframe", "frame", "frameset", "applet", "object", "embed", "form", "base",
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),
}

/// Root settings for the engine.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub wiki: WikiSettings,
    pub cache: CacheSettings,
    pub sanitizer: SanitizerSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from an optional TOML file, with `FOLIANT__*` environment
    /// variables layered on top.
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

/// Wiki-facing settings consumed by the link and image resolvers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    /// Base URL path that relative image sources are resolved under.
    pub attachments_url_path: String,
    /// Tag designating the site homepage; pages carrying it get dedicated
    /// cache invalidation on update.
    pub homepage_tag: String,
    /// Public site URL exposed to token substitution (`%SITEURL%`).
    pub site_url: String,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            attachments_url_path: DEFAULT_ATTACHMENTS_URL_PATH.to_string(),
            homepage_tag: DEFAULT_HOMEPAGE_TAG.to_string(),
            site_url: String::new(),
        }
    }
}

/// Cache behavior. When `enabled` is false every cache write is a no-op and
/// every read is a guaranteed miss; callers recompute.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Maximum entries held by the in-process store before LRU eviction.
    pub entry_limit: usize,
    /// Optional TTL applied to page view entries, in seconds.
    pub page_view_ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            entry_limit: DEFAULT_CACHE_ENTRY_LIMIT,
            page_view_ttl_secs: None,
        }
    }
}

/// Harmful-tag removal configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SanitizerSettings {
    /// Tags removed together with their content.
    pub denied_tags: Vec<String>,
    /// Extra tags allowed on top of the built-in allow list.
    pub allowed_tags: Vec<String>,
    /// Extra generic attributes allowed on any element.
    pub allowed_attributes: Vec<String>,
}

impl Default for SanitizerSettings {
    fn default() -> Self {
        Self {
            denied_tags: DEFAULT_DENIED_TAGS.iter().map(|t| t.to_string()).collect(),
            allowed_tags: Vec::new(),
            allowed_attributes: Vec::new(),
        }
    }
}

/// Pipeline-level render settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Cache plugin hook output keyed by (plugin, page, version). Honors the
    /// global cache toggle; turning this off recomputes hooks every render.
    pub cache_plugin_output: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            cache_plugin_output: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}
