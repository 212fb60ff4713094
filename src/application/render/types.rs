//! Shared types for the markup transform pipeline.

use thiserror::Error;

use crate::domain::entities::LATEST_VERSION;

/// Identity of the content being rendered, as seen by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReference {
    pub page_id: i64,
    /// The concrete version being rendered, never the latest-sentinel.
    pub version_number: u32,
}

impl PageReference {
    pub fn new(page_id: i64, version_number: u32) -> Self {
        Self {
            page_id,
            version_number,
        }
    }

    /// Whether the referenced version is immutable. The latest-sentinel is
    /// excluded because a concrete version number never changes content,
    /// while "latest" does.
    pub fn is_fixed_version(&self) -> bool {
        self.version_number != LATEST_VERSION
    }
}

/// Final pipeline output: HTML safe to serve without further processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHtml {
    pub html: String,
    /// True when markup conversion failed and the output is the escaped
    /// plain text of the raw markup instead of converted HTML.
    pub degraded: bool,
}

impl PageHtml {
    pub fn converted(html: String) -> Self {
        Self {
            html,
            degraded: false,
        }
    }

    pub fn degraded(html: String) -> Self {
        Self {
            html,
            degraded: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
}
