//! Foliant cache system.
//!
//! All cache entries live in one key/value store, partitioned by key prefix:
//!
//! - **`list:`** — materialized collections (all pages, by tag, by author)
//! - **`site:`** — cross-cutting artifacts (menus, plugin settings/output)
//! - **`page:`** — rendered page views keyed by (page id, version)
//!
//! Each cache component tracks the keys it created so it can bulk-sweep its
//! own namespace even though the underlying store has no key enumeration.
//! The [`MutationCoordinator`] translates content mutations into the
//! minimal-but-sufficient set of invalidations.
//!
//! Caches are never the system of record: every entry is recomputable from
//! durable state, and a disabled cache simply turns every read into a miss.

mod config;
mod coordinator;
mod keys;
mod list;
mod lock;
mod page_view;
mod planner;
mod site;
mod store;

pub use config::CacheConfig;
pub use coordinator::{MutationCoordinator, UpdateTarget};
pub use keys::{
    HookStage, LIST_PREFIX, PAGE_PREFIX, SITE_PREFIX, admin_menu_key, homepage_key,
    latest_page_view_key, list_key, logged_in_menu_key, menu_key, page_view_key,
    page_view_prefix, plugin_output_key, plugin_settings_key,
};
pub use list::ListCache;
pub use page_view::PageViewCache;
pub use planner::{InvalidationPlan, MutationEvent, MutationKind};
pub use site::SiteCache;
pub use store::{CacheStore, MemoryStore};
