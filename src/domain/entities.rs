//! Domain entities mirrored from persistent storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Sentinel version number meaning "resolve to the current latest version"
/// rather than a fixed one.
pub const LATEST_VERSION: u32 = 0;

/// A wiki page. Content lives in [`PageContentVersion`] entries; the record
/// carries identity, authorship and tag membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: i64,
    pub title: String,
    pub created_by: String,
    pub created_on: OffsetDateTime,
    pub modified_by: String,
    pub modified_on: OffsetDateTime,
    pub is_locked: bool,
    /// Delimiter-separated tag list with set semantics; order is irrelevant.
    pub tags: String,
}

impl PageRecord {
    /// Parse the raw tag string into a set. Both `,` and `;` act as
    /// delimiters; surrounding whitespace and empty segments are dropped.
    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tags
            .split([',', ';'])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Membership test against the tag set, ignoring case.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_set()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

/// One immutable revision of a page's markup text. Version numbers increase
/// monotonically per page; exactly one version per page is latest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContentVersion {
    pub page_id: i64,
    pub version_number: u32,
    /// Raw wiki markup as stored.
    pub text: String,
    pub edited_by: String,
    pub edited_on: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn page_with_tags(tags: &str) -> PageRecord {
        PageRecord {
            id: 1,
            title: "Test".to_string(),
            created_by: "editor".to_string(),
            created_on: datetime!(2024-01-01 00:00 UTC),
            modified_by: "editor".to_string(),
            modified_on: datetime!(2024-01-02 00:00 UTC),
            is_locked: false,
            tags: tags.to_string(),
        }
    }

    #[test]
    fn tag_set_splits_and_trims() {
        let page = page_with_tags("homepage, guide ;api,");
        let tags = page.tag_set();
        assert_eq!(tags.len(), 3);
        assert!(tags.contains("homepage"));
        assert!(tags.contains("guide"));
        assert!(tags.contains("api"));
    }

    #[test]
    fn tag_set_order_is_irrelevant() {
        let a = page_with_tags("alpha,beta");
        let b = page_with_tags("beta, alpha");
        assert_eq!(a.tag_set(), b.tag_set());
    }

    #[test]
    fn has_tag_ignores_case() {
        let page = page_with_tags("Homepage");
        assert!(page.has_tag("homepage"));
        assert!(!page.has_tag("guide"));
    }

    #[test]
    fn empty_tag_string_yields_empty_set() {
        let page = page_with_tags("  ");
        assert!(page.tag_set().is_empty());
    }
}
