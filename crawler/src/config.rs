use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Stop once this many pages were fetched and turned into documents.
    pub max_pages: usize,
    /// Only links whose host contains this substring enter the frontier.
    pub domain: Option<String>,
    /// Fetches in flight at once.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts for transport errors and timeouts.
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub user_agent: String,
    pub max_body_bytes: usize,
    /// Wall-clock budget for the whole crawl.
    pub deadline: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            max_pages: 100,
            domain: None,
            concurrency: 16,
            timeout: Duration::from_secs(12),
            max_retries: 1,
            retry_backoff: Duration::from_millis(250),
            user_agent: "pagesearch-bot/0.1 (+https://example.com/bot)".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            deadline: None,
        }
    }
}
