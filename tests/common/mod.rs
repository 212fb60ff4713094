//! Shared fixtures for integration tests.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::sync::Mutex;

use time::macros::datetime;

use foliant::application::{PageStore, RepoError};
use foliant::domain::entities::{PageContentVersion, PageRecord};

/// In-memory page storage with mutable content, so tests can land new
/// versions mid-flight and observe invalidation behavior.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: Mutex<Vec<PageRecord>>,
    versions: Mutex<Vec<PageContentVersion>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_page(&self, id: i64, title: &str, tags: &str, text: &str) {
        self.pages.lock().unwrap().push(PageRecord {
            id,
            title: title.to_string(),
            created_by: "author".to_string(),
            created_on: datetime!(2024-01-01 00:00 UTC),
            modified_by: "author".to_string(),
            modified_on: datetime!(2024-01-02 00:00 UTC),
            is_locked: false,
            tags: tags.to_string(),
        });
        self.insert_version(id, 1, text);
    }

    pub fn insert_version(&self, page_id: i64, version_number: u32, text: &str) {
        self.versions.lock().unwrap().push(PageContentVersion {
            page_id,
            version_number,
            text: text.to_string(),
            edited_by: "author".to_string(),
            edited_on: datetime!(2024-01-02 00:00 UTC),
        });
    }

    pub fn retag_page(&self, page_id: i64, tags: &str) {
        let mut pages = self.pages.lock().unwrap();
        if let Some(page) = pages.iter_mut().find(|page| page.id == page_id) {
            page.tags = tags.to_string();
        }
    }
}

impl PageStore for MemoryPageStore {
    fn find_by_id(&self, page_id: i64) -> Result<Option<PageRecord>, RepoError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|page| page.id == page_id)
            .cloned())
    }

    fn find_by_title(&self, title: &str) -> Result<Option<PageRecord>, RepoError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|page| page.title == title)
            .cloned())
    }

    fn find_by_tag(&self, tag: &str) -> Result<Vec<PageRecord>, RepoError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|page| page.has_tag(tag))
            .cloned()
            .collect())
    }

    fn latest_version(&self, page_id: i64) -> Result<Option<PageContentVersion>, RepoError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .filter(|version| version.page_id == page_id)
            .max_by_key(|version| version.version_number)
            .cloned())
    }

    fn version(
        &self,
        page_id: i64,
        version_number: u32,
    ) -> Result<Option<PageContentVersion>, RepoError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .find(|version| version.page_id == page_id && version.version_number == version_number)
            .cloned())
    }
}
