//! Patent Database Module
//!
//! Looks up the canonical title of a single patent on Google Patents:
//! - `fetcher`: HTTP document fetch behind the [`DocumentFetcher`] trait
//! - `google`: identifier normalization, page URLs and bounded retries
//! - `title`: title extraction from page markup and title validation

pub mod fetcher;
pub mod google;
pub mod title;

pub use fetcher::{DocumentFetcher, ReqwestFetcher};
pub use google::{normalize_patent_id, GooglePatents};
pub use title::{extract_title, TitleRules};

use thiserror::Error;

/// Errors that can occur while fetching a patent page
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Transport(String),
}

impl FetchError {
    /// Server errors, throttling, timeouts and connection failures may succeed
    /// on a second attempt; other client errors will not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status(code) => *code >= 500 || *code == 429,
            FetchError::Timeout | FetchError::Transport(_) => true,
        }
    }
}

/// Why no canonical title could be recorded for a patent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TitleError {
    #[error("Patent page not found")]
    NotFound,

    #[error("Patent page unreachable: {0}")]
    Fetch(#[from] FetchError),

    #[error("No title element on patent page")]
    Missing,

    #[error("Scraped text rejected as a title: {0}")]
    ValidationRejected(String),
}
