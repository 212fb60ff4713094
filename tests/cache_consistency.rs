//! Cache coherency behavior through the engine facade.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use foliant::application::{ContentEngine, PageStore, RepoError};
use foliant::config::Settings;
use foliant::domain::entities::{LATEST_VERSION, PageContentVersion, PageRecord};

use common::MemoryPageStore;

fn engine_over(store: Arc<MemoryPageStore>) -> ContentEngine {
    ContentEngine::builder(Settings::default(), store).build()
}

#[test]
fn invalidation_completes_before_the_call_returns() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "first");
    let engine = engine_over(store.clone());

    engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_some());

    store.insert_version(1, 2, "second");
    engine.invalidate_on_page_update(1, Some(1)).expect("invalidate");

    // The sentinel entry is gone the moment the call returns.
    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_none());

    let fresh = engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(fresh.html.contains("second"));
}

#[test]
fn stale_views_are_served_until_a_mutation_is_reported() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "first");
    let engine = engine_over(store.clone());

    engine.render_page(1, LATEST_VERSION).expect("render");
    store.insert_version(1, 2, "second");

    // Staleness is the contract: caches change only when told to.
    let stale = engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(stale.html.contains("first"));
}

#[test]
fn disabling_the_cache_makes_every_render_fresh() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "first");
    let mut settings = Settings::default();
    settings.cache.enabled = false;
    let engine = ContentEngine::builder(settings, store.clone()).build();

    engine.render_page(1, LATEST_VERSION).expect("render");
    store.insert_version(1, 2, "second");

    let fresh = engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(fresh.html.contains("second"));
    assert!(engine.page_view_cache().all_keys().is_empty());
}

#[test]
fn homepage_entry_follows_the_homepage_tag() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Home", "homepage,intro", "welcome");
    let engine = engine_over(store.clone());

    engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(engine.cached_homepage().is_some());

    // Losing the homepage tag drops the entry on the next update report.
    store.retag_page(1, "intro");
    store.insert_version(1, 2, "welcome again");
    engine.invalidate_on_page_update(1, Some(1)).expect("invalidate");
    assert!(engine.cached_homepage().is_none());

    engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(engine.cached_homepage().is_none());
}

#[test]
fn tag_rename_reaches_every_page_carrying_the_tag() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "A", "docs", "a");
    store.insert_page(2, "B", "docs,extra", "b");
    store.insert_page(3, "C", "other", "c");
    let engine = engine_over(store);

    for id in 1..=3 {
        engine.render_page(id, LATEST_VERSION).expect("render");
    }
    engine.list_cache().add("by_tag.docs", &[1_i64, 2]);

    engine.invalidate_on_tag_rename("docs").expect("invalidate");

    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_none());
    assert!(engine.page_view_cache().get(2, LATEST_VERSION).is_none());
    assert!(engine.page_view_cache().get(3, LATEST_VERSION).is_some());
    assert!(engine.list_cache().get::<i64>("by_tag.docs").is_none());
}

#[test]
fn delete_leaves_other_pages_untouched() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "A", "docs", "a");
    store.insert_page(2, "B", "docs", "b");
    let engine = engine_over(store.clone());

    store.insert_version(1, 2, "a2");
    engine.render_page(1, 1).expect("render");
    engine.render_page(1, LATEST_VERSION).expect("render");
    engine.render_page(2, LATEST_VERSION).expect("render");

    engine.invalidate_on_page_delete(1);

    assert!(engine.page_view_cache().get(1, 1).is_none());
    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_none());
    assert!(engine.page_view_cache().get(2, LATEST_VERSION).is_some());
}

#[test]
fn cold_cache_race_produces_identical_views() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "# Guide\n\nbody");
    let engine = Arc::new(engine_over(store));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || engine.render_page(1, LATEST_VERSION).expect("render"))
        })
        .collect();
    let views: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("render thread"))
        .collect();

    for view in &views {
        assert_eq!(view.html, views[0].html);
    }
    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_some());
}

#[test]
fn concurrent_readers_survive_interleaved_invalidation() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "rev-1");
    let engine = Arc::new(engine_over(store.clone()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let view = engine.render_page(1, LATEST_VERSION).expect("render");
                    assert!(view.html.contains("rev-"));
                }
            })
        })
        .collect();

    for revision in 2..=10 {
        store.insert_version(1, revision, &format!("rev-{revision}"));
        engine
            .invalidate_on_page_update(1, Some(revision - 1))
            .expect("invalidate");
    }

    for reader in readers {
        reader.join().expect("reader thread");
    }

    // Guarded write-backs mean no reader can have re-cached a view rendered
    // before the last invalidation.
    let settled = engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(settled.html.contains("rev-10"));
}

/// Pauses the first latest-version lookup until released, so a test can run
/// a mutation while a render holds already-loaded content.
struct PausingStore {
    inner: Arc<MemoryPageStore>,
    entered: SyncSender<()>,
    release: Mutex<Receiver<()>>,
    paused_once: AtomicBool,
}

impl PageStore for PausingStore {
    fn find_by_id(&self, page_id: i64) -> Result<Option<PageRecord>, RepoError> {
        self.inner.find_by_id(page_id)
    }

    fn find_by_title(&self, title: &str) -> Result<Option<PageRecord>, RepoError> {
        self.inner.find_by_title(title)
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<PageRecord>, RepoError> {
        self.inner.find_by_tag(tag)
    }

    fn latest_version(&self, page_id: i64) -> Result<Option<PageContentVersion>, RepoError> {
        let result = self.inner.latest_version(page_id);
        if !self.paused_once.swap(true, Ordering::SeqCst) {
            let _ = self.entered.send(());
            let _ = self.release.lock().unwrap().recv();
        }
        result
    }

    fn version(
        &self,
        page_id: i64,
        version_number: u32,
    ) -> Result<Option<PageContentVersion>, RepoError> {
        self.inner.version(page_id, version_number)
    }
}

#[test]
fn in_flight_render_cannot_resurrect_invalidated_content() {
    let inner = Arc::new(MemoryPageStore::new());
    inner.insert_page(1, "Guide", "guide", "old content");

    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(PausingStore {
        inner: inner.clone(),
        entered: entered_tx,
        release: Mutex::new(release_rx),
        paused_once: AtomicBool::new(false),
    });
    let engine = Arc::new(ContentEngine::builder(Settings::default(), store).build());

    let renderer = {
        let engine = engine.clone();
        thread::spawn(move || engine.render_page(1, LATEST_VERSION).expect("render"))
    };
    entered_rx.recv().expect("renderer reached the store");

    // The mutation lands and is reported while the renderer still holds the
    // old content.
    inner.insert_version(1, 2, "new content");
    engine.invalidate_on_page_update(1, Some(1)).expect("invalidate");
    release_tx.send(()).expect("release renderer");

    let stale = renderer.join().expect("renderer thread");
    assert!(stale.html.contains("old content"));

    // The overtaken write-back was dropped, so the next read is fresh.
    assert!(engine.page_view_cache().get(1, LATEST_VERSION).is_none());
    let fresh = engine.render_page(1, LATEST_VERSION).expect("render");
    assert!(fresh.html.contains("new content"));
}

#[test]
fn update_drops_the_replaced_version_entry() {
    let store = Arc::new(MemoryPageStore::new());
    store.insert_page(1, "Guide", "guide", "v1 text");
    let engine = engine_over(store.clone());

    engine.render_page(1, 1).expect("render");
    assert_eq!(
        engine.page_view_cache().get(1, 1).map(|view| view.tags),
        Some(vec!["guide".to_string()])
    );

    store.insert_version(1, 2, "v2 text");
    store.retag_page(1, "reference");
    engine.invalidate_on_page_update(1, Some(1)).expect("invalidate");

    // The superseded version's entry carried pre-update metadata; it must
    // not survive the report.
    assert!(engine.page_view_cache().get(1, 1).is_none());
    let fresh = engine.render_page(1, 1).expect("render");
    assert_eq!(fresh.tags, vec!["reference".to_string()]);
}

#[test]
fn cache_reads_report_hits_and_misses() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let store = Arc::new(MemoryPageStore::new());
        store.insert_page(1, "Guide", "guide", "text");
        let engine = engine_over(store);

        engine.render_page(1, LATEST_VERSION).expect("render");
        engine.render_page(1, LATEST_VERSION).expect("render");
    });

    let mut hits = 0u64;
    let mut misses = 0u64;
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        if let DebugValue::Counter(count) = value {
            match key.key().name() {
                "foliant_cache_hit_total" => hits += count,
                "foliant_cache_miss_total" => misses += count,
                _ => {}
            }
        }
    }

    assert!(misses >= 1, "first render should miss");
    assert!(hits >= 1, "second render should hit");
}
