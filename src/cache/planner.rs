//! Invalidation plan generation.
//!
//! Merges a batch of mutation events into one deduplicated plan. Single
//! mutations produce single-event batches; a tag rename produces one update
//! event per affected page, and merging is what keeps the list sweep from
//! running once per page.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::domain::entities::LATEST_VERSION;

/// Monotonic ordering for events within one process. When two events touch
/// the same page, the higher epoch wins the merge.
pub type Epoch = u64;

static EPOCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A content mutation, as seen by the cache layer.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    /// Unique identifier for idempotency.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: MutationKind,
}

impl MutationEvent {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch: EPOCH_COUNTER.fetch_add(1, Ordering::SeqCst),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// A page was created. Every list-shaped query may now be incomplete.
    PageAdded { page_id: i64 },
    /// A page's content (or tag membership) changed. `replaced_version` is
    /// the version number that was latest before the mutation.
    PageUpdated {
        page_id: i64,
        replaced_version: Option<u32>,
        is_homepage: bool,
    },
    /// A page was deleted; every cached version of it is now orphaned.
    PageDeleted { page_id: i64 },
}

impl MutationKind {
    fn page_id(&self) -> i64 {
        match self {
            MutationKind::PageAdded { page_id }
            | MutationKind::PageUpdated { page_id, .. }
            | MutationKind::PageDeleted { page_id } => *page_id,
        }
    }
}

/// Cache actions to execute for one batch of mutations.
///
/// List invalidation is always a full-namespace sweep; page view entries are
/// removed surgically because the affected keys are known exactly.
#[derive(Debug, Default)]
pub struct InvalidationPlan {
    /// Sweep the whole `list:` namespace.
    pub sweep_lists: bool,
    /// (page id, version) view entries to remove. Includes latest-sentinel
    /// entries for updated pages.
    pub remove_views: HashSet<(i64, u32)>,
    /// Pages whose view entries are removed wholesale (deletes).
    pub remove_pages: HashSet<i64>,
    /// Remove the homepage-designated view entry.
    pub remove_homepage: bool,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ sweep_lists: {}, remove_views: {}, remove_pages: {}, \
             remove_homepage: {} }}",
            self.sweep_lists,
            self.remove_views.len(),
            self.remove_pages.len(),
            self.remove_homepage,
        )
    }
}

impl InvalidationPlan {
    /// Merge events into a plan.
    ///
    /// - Deduplicates by event ID
    /// - Groups by page, keeping the latest epoch (a delete following an
    ///   update wins)
    pub fn from_events(events: Vec<MutationEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids = HashSet::new();

        let events: Vec<_> = events
            .into_iter()
            .filter(|event| seen_ids.insert(event.id))
            .collect();

        let mut latest_per_page: HashMap<i64, (Epoch, MutationKind)> = HashMap::new();
        for event in events {
            plan.sweep_lists = true;
            let entry = latest_per_page.entry(event.kind.page_id());
            entry
                .and_modify(|(epoch, kind)| {
                    if event.epoch > *epoch {
                        *epoch = event.epoch;
                        *kind = event.kind.clone();
                    }
                })
                .or_insert((event.epoch, event.kind.clone()));
        }

        for (page_id, (_, kind)) in latest_per_page {
            match kind {
                MutationKind::PageAdded { .. } => {}
                MutationKind::PageUpdated {
                    replaced_version,
                    is_homepage,
                    ..
                } => {
                    plan.remove_views.insert((page_id, LATEST_VERSION));
                    if let Some(version) = replaced_version {
                        plan.remove_views.insert((page_id, version));
                    }
                    if is_homepage {
                        plan.remove_homepage = true;
                    }
                }
                MutationKind::PageDeleted { .. } => {
                    plan.remove_pages.insert(page_id);
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        !self.sweep_lists
            && self.remove_views.is_empty()
            && self.remove_pages.is_empty()
            && !self.remove_homepage
    }
}
