//! Durable page storage capability.
//!
//! The engine reads pages and their content versions through this trait and
//! never writes: content mutation belongs to the caller, which reports it
//! back through the invalidation operations.

use thiserror::Error;

use crate::domain::entities::{PageContentVersion, PageRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

impl RepoError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Read access to pages and their content versions.
pub trait PageStore: Send + Sync {
    fn find_by_id(&self, page_id: i64) -> Result<Option<PageRecord>, RepoError>;

    /// Exact, case-sensitive title lookup.
    fn find_by_title(&self, title: &str) -> Result<Option<PageRecord>, RepoError>;

    /// Pages carrying `tag`, matched case-insensitively.
    fn find_by_tag(&self, tag: &str) -> Result<Vec<PageRecord>, RepoError>;

    /// The newest content version of a page, if the page has any content.
    fn latest_version(&self, page_id: i64) -> Result<Option<PageContentVersion>, RepoError>;

    /// One specific content version.
    fn version(
        &self,
        page_id: i64,
        version_number: u32,
    ) -> Result<Option<PageContentVersion>, RepoError>;
}
