use crate::config::CrawlConfig;
use crate::error::CrawlError;
use reqwest::{header, Client, Url};
use std::future::Future;
use std::time::Duration;

/// Raw HTTP response as the crawler sees it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn html(body: impl Into<String>) -> Self {
        Self { status: 200, content_type: Some("text/html; charset=utf-8".into()), body: body.into().into_bytes() }
    }

    pub fn with_status(status: u16) -> Self {
        Self { status, content_type: None, body: Vec::new() }
    }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// The network capability the crawler drives. Fetches are the crawler's only suspension points.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, CrawlError>> + Send;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(5)))
            .build()?;
        Ok(Self { client, max_body_bytes: config.max_body_bytes })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, CrawlError> {
        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() { CrawlError::Timeout } else { CrawlError::Transport(e.to_string()) }
        })?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !resp.status().is_success() {
            return Ok(FetchedPage { status, content_type, body: Vec::new() });
        }
        if resp.content_length().is_some_and(|n| n as usize > self.max_body_bytes) {
            return Err(CrawlError::Extraction(format!("body larger than {} bytes", self.max_body_bytes)));
        }
        let body = resp.bytes().await.map_err(|e| CrawlError::Transport(e.to_string()))?;
        Ok(FetchedPage { status, content_type, body: body.to_vec() })
    }
}
