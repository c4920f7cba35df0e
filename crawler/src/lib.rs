//! Breadth-first site crawler.
//!
//! The coordinator loop owns the frontier and the visited set. Worker tasks only fetch and
//! parse; the links they find come back to the coordinator, which is the single place a URL
//! can be enqueued. A URL is marked visited when it is enqueued, so it is fetched at most once.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod links;

pub use config::CrawlConfig;
pub use error::CrawlError;
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};

use anyhow::{anyhow, bail, Result};
use pagesearch_core::persist::CrawlReport;
use pagesearch_core::tokenizer::word_counts;
use pagesearch_core::{DocId, Document, WebGraph};
use reqwest::Url;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use tokio::time::{sleep, sleep_until, timeout, Instant};

/// A URL that produced no document, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    pub url: String,
    pub error: CrawlError,
}

#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub seed: String,
    /// Ids follow completion order.
    pub documents: Vec<Document>,
    pub unknown_anchors: Vec<String>,
    pub failures: Vec<FailedUrl>,
    pub graph: WebGraph,
    /// Frontier left unfetched when the crawl stopped, including abandoned in-flight URLs.
    pub pending: Vec<String>,
    /// Set when a deadline or shutdown signal ended the crawl.
    pub interrupted: bool,
}

impl CrawlOutcome {
    /// Unreachable URLs and non-success responses.
    pub fn broken_urls(&self) -> Vec<String> {
        self.failures.iter().filter(|f| f.error.is_broken()).map(|f| f.url.clone()).collect()
    }

    /// Fetched but not usable as documents.
    pub fn skipped_urls(&self) -> Vec<String> {
        self.failures.iter().filter(|f| !f.error.is_broken()).map(|f| f.url.clone()).collect()
    }

    pub fn report(&self) -> CrawlReport {
        CrawlReport {
            seed: self.seed.clone(),
            unknown_anchors: self.unknown_anchors.clone(),
            broken_urls: self.broken_urls(),
            skipped_urls: self.skipped_urls(),
            pending: self.pending.clone(),
        }
    }
}

/// What a worker brings back from one page.
struct Visit {
    outgoing: Vec<Url>,
    unknown: Vec<String>,
    word_counts: HashMap<String, u32>,
}

pub struct Crawler<F: Fetcher> {
    fetcher: Arc<F>,
    config: Arc<CrawlConfig>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self { fetcher: Arc::new(fetcher), config: Arc::new(config) }
    }

    pub fn config(&self) -> &CrawlConfig { &self.config }

    pub async fn run(&self, seed: &str) -> Result<CrawlOutcome> {
        self.run_until(seed, std::future::pending::<()>()).await
    }

    /// Crawl from `seed` until the frontier drains, `max_pages` documents exist, the deadline
    /// passes, or `shutdown` resolves. The last two abandon in-flight fetches and still return
    /// everything collected so far.
    pub async fn run_until<S>(&self, seed: &str, shutdown: S) -> Result<CrawlOutcome>
    where
        S: Future<Output = ()>,
    {
        let seed = links::parse_seed(seed).map_err(|e| anyhow!("invalid seed url {seed:?}: {e}"))?;
        let cfg = self.config.clone();
        let domain = cfg.domain.as_deref();
        if !links::in_domain(&seed, domain) {
            bail!("seed {seed} is outside domain {:?}", domain.unwrap_or(""));
        }
        tracing::info!(
            seed = %seed,
            max_pages = cfg.max_pages,
            concurrency = cfg.concurrency,
            domain = domain.unwrap_or(""),
            "crawl starting"
        );

        let mut outcome = CrawlOutcome { seed: seed.to_string(), ..Default::default() };
        let mut frontier: VecDeque<Url> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut unknown_seen: HashSet<String> = HashSet::new();
        let mut in_flight: HashMap<task::Id, Url> = HashMap::new();
        let mut tasks: JoinSet<Result<Visit, CrawlError>> = JoinSet::new();
        visited.insert(seed.to_string());
        frontier.push_back(seed);

        let deadline = cfg.deadline.map(|d| Instant::now() + d);
        let expired = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);
        tokio::pin!(shutdown);

        loop {
            while tasks.len() < cfg.concurrency.max(1) && outcome.documents.len() + tasks.len() < cfg.max_pages {
                let Some(url) = frontier.pop_front() else { break };
                let fetcher = self.fetcher.clone();
                let cfg = cfg.clone();
                let target = url.clone();
                let handle = tasks.spawn(async move { visit(fetcher.as_ref(), &target, &cfg).await });
                in_flight.insert(handle.id(), url);
            }
            // Nothing running means the frontier is empty or the page budget is spent.
            if tasks.is_empty() {
                break;
            }

            let joined = tokio::select! {
                joined = tasks.join_next_with_id() => joined,
                _ = &mut expired => {
                    tracing::warn!(in_flight = tasks.len(), "crawl deadline reached, abandoning in-flight fetches");
                    outcome.interrupted = true;
                    break;
                }
                _ = &mut shutdown => {
                    tracing::warn!(in_flight = tasks.len(), "shutdown requested, abandoning in-flight fetches");
                    outcome.interrupted = true;
                    break;
                }
            };

            let Some(joined) = joined else { break };
            let task_id = match &joined {
                Ok((id, _)) => *id,
                Err(e) => e.id(),
            };
            let Some(url) = in_flight.remove(&task_id) else {
                tracing::error!(task = %task_id, "finished task has no url");
                continue;
            };
            match joined {
                Ok((_, Ok(page))) => {
                    for link in &page.outgoing {
                        if visited.insert(link.to_string()) {
                            frontier.push_back(link.clone());
                        }
                    }
                    for anchor in page.unknown {
                        if unknown_seen.insert(anchor.clone()) {
                            outcome.unknown_anchors.push(anchor);
                        }
                    }
                    let outgoing: Vec<String> = page.outgoing.iter().map(Url::to_string).collect();
                    outcome.graph.add_page(url.as_str(), &outgoing);
                    let id = outcome.documents.len() as DocId;
                    outcome.documents.push(Document {
                        id,
                        url: url.to_string(),
                        outgoing_links: outgoing,
                        word_counts: page.word_counts,
                    });
                    let crawled = outcome.documents.len();
                    if crawled % 100 == 0 {
                        tracing::info!(crawled, visited = visited.len(), frontier = frontier.len(), "progress");
                    }
                }
                Ok((_, Err(error))) => {
                    tracing::warn!(url = %url, error = %error, "page skipped");
                    outcome.failures.push(FailedUrl { url: url.to_string(), error });
                }
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "crawl worker failed");
                    outcome.failures.push(FailedUrl { url: url.to_string(), error: CrawlError::Worker(e.to_string()) });
                }
            }
        }

        tasks.abort_all();
        let mut abandoned: Vec<String> = in_flight.into_values().map(String::from).collect();
        abandoned.sort();
        outcome.pending = abandoned.into_iter().chain(frontier.iter().map(Url::to_string)).collect();

        tracing::info!(
            documents = outcome.documents.len(),
            failures = outcome.failures.len(),
            unknown_anchors = outcome.unknown_anchors.len(),
            pending = outcome.pending.len(),
            "crawl finished"
        );
        Ok(outcome)
    }
}

async fn visit<F: Fetcher>(fetcher: &F, url: &Url, cfg: &CrawlConfig) -> Result<Visit, CrawlError> {
    let page = fetch_with_retry(fetcher, url, cfg).await?;
    if !page.is_success() {
        return Err(CrawlError::Status(page.status));
    }
    if let Some(ct) = &page.content_type {
        if !ct.starts_with("text/html") {
            return Err(CrawlError::Extraction(format!("unsupported content type {ct}")));
        }
    }
    if page.body.len() > cfg.max_body_bytes {
        return Err(CrawlError::Extraction(format!("body larger than {} bytes", cfg.max_body_bytes)));
    }
    let body = String::from_utf8_lossy(&page.body);
    let extracted = extract::extract(&body);
    let links = links::classify(url, &extracted.hrefs, cfg.domain.as_deref());
    Ok(Visit { outgoing: links.outgoing, unknown: links.unknown, word_counts: word_counts(&extracted.text) })
}

/// Transport errors and timeouts get up to `max_retries` more attempts with linear backoff.
async fn fetch_with_retry<F: Fetcher>(fetcher: &F, url: &Url, cfg: &CrawlConfig) -> Result<FetchedPage, CrawlError> {
    let mut attempt = 0;
    loop {
        let result = match timeout(cfg.timeout, fetcher.fetch(url)).await {
            Ok(r) => r,
            Err(_) => Err(CrawlError::Timeout),
        };
        match result {
            Err(e) if e.is_transient() && attempt < cfg.max_retries => {
                attempt += 1;
                tracing::debug!(url = %url, attempt, error = %e, "retrying fetch");
                sleep(cfg.retry_backoff * attempt).await;
            }
            other => return other,
        }
    }
}
