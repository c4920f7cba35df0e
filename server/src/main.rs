use anyhow::Result;
use axum::Router;
use clap::Parser;
use pagesearch_core::config::DEFAULT_WARMUP_QUERY;
use pagesearch_core::RankerConfig;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Corpus store directory
    #[arg(long, default_value = "./store")]
    store: String,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Candidates kept after cosine ranking
    #[arg(long, default_value_t = 200)]
    candidates: usize,
    /// URLs returned per query
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Query batched with each user query; empty disables it
    #[arg(long, default_value = DEFAULT_WARMUP_QUERY)]
    warmup_query: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let ranker = RankerConfig {
        top_candidates: args.candidates,
        top_final: args.top,
        warmup_query: Some(args.warmup_query.clone()).filter(|w| !w.trim().is_empty()),
    };
    let app: Router = build_app(&args.store, ranker)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
