//! Application-level error taxonomy.

use thiserror::Error;

use super::repos::RepoError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("page {page_id} not found")]
    PageNotFound { page_id: i64 },

    #[error("page {page_id} has no version {version_number}")]
    VersionNotFound { page_id: i64, version_number: u32 },

    #[error(transparent)]
    Repo(#[from] RepoError),
}
