//! Mutation coordinator: turns content mutations into cache invalidations.
//!
//! Invalidation runs synchronously inside the mutating call, before it
//! returns. A reader that starts after a mutation completes can therefore
//! never observe pre-mutation cache state.

use std::sync::Arc;

use tracing::info;

use super::list::ListCache;
use super::page_view::PageViewCache;
use super::planner::{InvalidationPlan, MutationEvent, MutationKind};

const SOURCE: &str = "cache::coordinator";

/// One page touched by a bulk mutation such as a tag rename.
#[derive(Debug, Clone, Copy)]
pub struct UpdateTarget {
    pub page_id: i64,
    /// Version number that was latest before the mutation, if any.
    pub replaced_version: Option<u32>,
    pub is_homepage: bool,
}

pub struct MutationCoordinator {
    lists: Arc<ListCache>,
    views: Arc<PageViewCache>,
}

impl MutationCoordinator {
    pub fn new(lists: Arc<ListCache>, views: Arc<PageViewCache>) -> Self {
        Self { lists, views }
    }

    /// A page was created: list-shaped entries are stale, views are not.
    pub fn page_added(&self, page_id: i64) {
        self.apply(vec![MutationEvent::new(MutationKind::PageAdded { page_id })]);
    }

    /// A page's content or metadata changed.
    pub fn page_updated(&self, target: UpdateTarget) {
        self.apply(vec![MutationEvent::new(MutationKind::PageUpdated {
            page_id: target.page_id,
            replaced_version: target.replaced_version,
            is_homepage: target.is_homepage,
        })]);
    }

    /// A page was deleted: drop every cached view of it.
    pub fn page_deleted(&self, page_id: i64) {
        self.apply(vec![MutationEvent::new(MutationKind::PageDeleted { page_id })]);
    }

    /// A tag was renamed across many pages. The batch merges into a single
    /// plan, so the list sweep runs once no matter how many pages changed.
    pub fn tag_renamed(&self, targets: &[UpdateTarget]) {
        let events = targets
            .iter()
            .map(|target| {
                MutationEvent::new(MutationKind::PageUpdated {
                    page_id: target.page_id,
                    replaced_version: target.replaced_version,
                    is_homepage: target.is_homepage,
                })
            })
            .collect();
        self.apply(events);
    }

    fn apply(&self, events: Vec<MutationEvent>) {
        let plan = InvalidationPlan::from_events(events);
        if plan.is_empty() {
            return;
        }

        info!(source = SOURCE, plan = %plan, "Applying invalidation plan");

        if plan.sweep_lists {
            self.lists.remove_all();
        }
        for (page_id, version_number) in &plan.remove_views {
            self.views.remove(*page_id, *version_number);
        }
        for page_id in &plan.remove_pages {
            self.views.remove_page(*page_id);
        }
        if plan.remove_homepage {
            self.views.remove_homepage();
        }
    }
}
