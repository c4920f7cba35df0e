use anyhow::Result;
use clap::Parser;
use crawler::{CrawlConfig, Crawler, HttpFetcher};
use pagesearch_core::CorpusStore;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl a site breadth-first into the corpus store")]
struct Cli {
    /// URL to start crawling from
    #[arg(long)]
    seed: String,
    /// Number of pages to turn into documents
    #[arg(long, default_value_t = 100)]
    pages: usize,
    /// Only follow links whose host contains this string (e.g. "uni.edu")
    #[arg(long)]
    domain: Option<String>,
    /// Corpus store directory
    #[arg(long, default_value = "./store")]
    store: String,
    /// Concurrency (number of workers)
    #[arg(long, default_value_t = 16)]
    concurrency: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// Extra attempts for transport errors
    #[arg(long, default_value_t = 1)]
    max_retries: u32,
    /// Stop the crawl after this many seconds and keep what was collected
    #[arg(long)]
    deadline_secs: Option<u64>,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "pagesearch-bot/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

impl Cli {
    fn config(&self) -> CrawlConfig {
        CrawlConfig {
            max_pages: self.pages,
            domain: self.domain.clone().filter(|d| !d.is_empty()),
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            user_agent: self.user_agent.clone(),
            deadline: self.deadline_secs.map(Duration::from_secs),
            ..CrawlConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();
    let store = CorpusStore::open(&args.store)?;
    let config = args.config();
    let crawler = Crawler::new(HttpFetcher::new(&config)?, config);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let outcome = crawler.run_until(&args.seed, shutdown).await?;

    store.save_documents(&outcome.documents)?;
    let report = outcome.report();
    store.save_crawl_report(&report)?;

    tracing::info!(
        documents = outcome.documents.len(),
        broken = report.broken_urls.len(),
        skipped = report.skipped_urls.len(),
        unknown_anchors = report.unknown_anchors.len(),
        interrupted = outcome.interrupted,
        store = %args.store,
        "crawl saved"
    );
    Ok(())
}
