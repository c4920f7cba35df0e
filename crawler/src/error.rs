use thiserror::Error;

/// Per-URL failure. None of these stop a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("worker failed: {0}")]
    Worker(String),
}

impl CrawlError {
    /// Worth another attempt under the retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::Transport(_) | CrawlError::Timeout)
    }

    /// The page could not be reached at all (as opposed to reached but unusable).
    pub fn is_broken(&self) -> bool {
        !matches!(self, CrawlError::Extraction(_) | CrawlError::Worker(_))
    }
}
