//! Internal link resolution.
//!
//! Rewrites wiki-internal link targets found in the markup AST. External
//! targets pass through untouched; everything else is treated as a page
//! title and resolved against durable page storage.

use std::sync::Arc;

use tracing::debug;
use url::form_urlencoded;

use crate::application::repos::PageStore;

const SPECIAL_PREFIX: &str = "special:";

/// Schemes and shapes that are never treated as page titles.
const PASSTHROUGH_PREFIXES: &[&str] = &["http://", "https://", "www.", "mailto:", "tel:", "#"];

pub struct LinkResolver {
    store: Arc<dyn PageStore>,
}

impl LinkResolver {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    /// Resolve one link target to its final href.
    ///
    /// Titles match case-sensitively; a miss routes to the new-page form so
    /// broken links become an invitation to write the page. A storage error
    /// degrades to the same route rather than failing the render.
    pub fn resolve(&self, href: &str) -> String {
        if is_passthrough(href) {
            return href.to_string();
        }

        if let Some(name) = strip_special_prefix(href) {
            return format!("/wiki/Special:{name}");
        }

        match self.store.find_by_title(href) {
            Ok(Some(page)) => format!("/wiki/{}/{}", page.id, encode_component(&page.title)),
            Ok(None) => new_page_route(href),
            Err(err) => {
                debug!(href, error = %err, "Link lookup failed; routing to new-page form");
                new_page_route(href)
            }
        }
    }
}

fn is_passthrough(href: &str) -> bool {
    PASSTHROUGH_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(href, prefix))
}

fn strip_special_prefix(href: &str) -> Option<&str> {
    if starts_with_ignore_case(href, SPECIAL_PREFIX) && href.len() > SPECIAL_PREFIX.len() {
        Some(&href[SPECIAL_PREFIX.len()..])
    } else {
        None
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn new_page_route(title: &str) -> String {
    format!("/pages/new?title={}", encode_component(title))
}

fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}
