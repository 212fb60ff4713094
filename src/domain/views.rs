//! Derived, cacheable projections of domain entities.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::entities::{PageContentVersion, PageRecord};

const SUMMARY_MAX_CHARS: usize = 150;

/// Fully rendered view of a page at one version. Created on demand by the
/// pipeline, stored in the page view cache, and invalidated whenever the
/// underlying version (or the page's homepage/tag membership) changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub page_id: i64,
    pub title: String,
    pub version_number: u32,
    /// Sanitized, link-resolved HTML.
    pub html: String,
    /// Plain-text leading summary extracted from the HTML.
    pub summary: String,
    pub tags: Vec<String>,
    pub is_locked: bool,
    pub modified_by: String,
    pub modified_on: OffsetDateTime,
}

impl PageView {
    /// Assemble the view from its durable sources plus the rendered HTML.
    pub fn assemble(page: &PageRecord, version: &PageContentVersion, html: String) -> Self {
        let summary = summarize(&html);
        Self {
            page_id: page.id,
            title: page.title.clone(),
            version_number: version.version_number,
            summary,
            html,
            tags: page.tag_set().into_iter().collect(),
            is_locked: page.is_locked,
            modified_by: page.modified_by.clone(),
            modified_on: page.modified_on,
        }
    }
}

/// Strip markup and collapse whitespace, truncating at a word boundary.
pub fn summarize(html: &str) -> String {
    let mut text = String::with_capacity(html.len().min(SUMMARY_MAX_CHARS * 2));
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    in_tag = false;
                    text.push(' ');
                }
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SUMMARY_MAX_CHARS {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(SUMMARY_MAX_CHARS).collect();
    if let Some(last_space) = truncated.rfind(' ') {
        truncated.truncate(last_space);
    }
    truncated.push('…');
    truncated
}
