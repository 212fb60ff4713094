//! Cache key derivation.
//!
//! Every cache entry lives under exactly one namespace prefix. The functions
//! here are the single authority for key text; no component builds keys by
//! hand, which is what keeps the "no entry crosses prefixes" invariant true.

use crate::domain::entities::LATEST_VERSION;

/// Namespace for materialized collections.
pub const LIST_PREFIX: &str = "list:";
/// Namespace for cross-cutting site artifacts.
pub const SITE_PREFIX: &str = "site:";
/// Namespace for rendered page views.
pub const PAGE_PREFIX: &str = "page:";

/// Plugin hook stage, part of the plugin-output key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforeParse,
    AfterParse,
}

impl HookStage {
    fn as_str(self) -> &'static str {
        match self {
            HookStage::BeforeParse => "pre",
            HookStage::AfterParse => "post",
        }
    }
}

/// Normalize a caller-supplied list key under the `list:` prefix. Keys that
/// already carry the prefix are left alone.
pub fn list_key(key: &str) -> String {
    if key.starts_with(LIST_PREFIX) {
        key.to_string()
    } else {
        format!("{LIST_PREFIX}{key}")
    }
}

pub fn menu_key() -> String {
    format!("{SITE_PREFIX}menu")
}

pub fn logged_in_menu_key() -> String {
    format!("{SITE_PREFIX}menu.loggedin")
}

pub fn admin_menu_key() -> String {
    format!("{SITE_PREFIX}menu.admin")
}

pub fn plugin_settings_key(plugin_id: &str) -> String {
    format!("{SITE_PREFIX}plugin.{plugin_id}.settings")
}

pub fn plugin_output_key(plugin_id: &str, page_id: i64, version_number: u32, stage: HookStage) -> String {
    format!(
        "{SITE_PREFIX}plugin.{plugin_id}.output.{page_id}.{version_number}.{}",
        stage.as_str()
    )
}

/// Key for a rendered page view. [`LATEST_VERSION`] acts as the
/// latest-sentinel: the entry under it must always reflect the current
/// latest version of the page.
pub fn page_view_key(page_id: i64, version_number: u32) -> String {
    format!("{PAGE_PREFIX}{page_id}.{version_number}")
}

/// Prefix shared by every view entry of one page, all versions included.
pub fn page_view_prefix(page_id: i64) -> String {
    format!("{PAGE_PREFIX}{page_id}.")
}

/// Key for the homepage-designated view entry.
pub fn homepage_key() -> String {
    format!("{PAGE_PREFIX}homepage")
}

/// Key for a page view resolving the latest version.
pub fn latest_page_view_key(page_id: i64) -> String {
    page_view_key(page_id, LATEST_VERSION)
}
