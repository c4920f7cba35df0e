use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pagesearch_core::config::DEFAULT_WARMUP_QUERY;
use pagesearch_core::pagerank::rank;
use pagesearch_core::persist::{MetaFile, STORE_VERSION};
use pagesearch_core::query::{rank_batch, search};
use pagesearch_core::{build_index, CorpusStore, PageRankConfig, RankerConfig, WebGraph};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build TF-IDF tables and PageRank scores from a crawled corpus, and query them", long_about = None)]
struct Cli {
    /// Corpus store directory written by the crawler
    #[arg(long, global = true, default_value = "./store")]
    store: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build TF, IDF and TF-IDF tables over every stored document
    Build,
    /// Compute PageRank over the stored link graph
    Rank {
        /// Random-jump probability
        #[arg(long, default_value_t = 0.15)]
        epsilon: f64,
        /// Maximum number of iterations
        #[arg(long, default_value_t = 20)]
        iterations: usize,
    },
    /// Rank stored pages for a query, or for a batch of `.`-terminated queries
    Search {
        /// A single query
        #[arg(long, conflicts_with = "batch_file")]
        query: Option<String>,
        /// File holding queries separated by `.`
        #[arg(long)]
        batch_file: Option<String>,
        /// Candidates kept after cosine ranking
        #[arg(long, default_value_t = 200)]
        candidates: usize,
        /// URLs printed per query
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Query batched with a single query so query IDF is meaningful; empty disables it
        #[arg(long, default_value = DEFAULT_WARMUP_QUERY)]
        warmup_query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let store = CorpusStore::open(&cli.store)?;

    match cli.command {
        Commands::Build => build(&store),
        Commands::Rank { epsilon, iterations } => {
            let config = PageRankConfig { epsilon, max_iterations: iterations, ..PageRankConfig::default() };
            compute_ranks(&store, &config)
        }
        Commands::Search { query, batch_file, candidates, top, warmup_query } => {
            let config = RankerConfig {
                top_candidates: candidates,
                top_final: top,
                warmup_query: Some(warmup_query).filter(|w| !w.trim().is_empty()),
            };
            run_search(&store, query, batch_file, &config)
        }
    }
}

fn build(store: &CorpusStore) -> Result<()> {
    let docs = store.load_documents()?;
    tracing::info!(num_docs = docs.len(), "loaded documents");
    let tables = build_index(&docs);
    let meta = MetaFile {
        num_docs: docs.len() as u32,
        vocabulary: tables.idf.len() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: STORE_VERSION,
    };
    store.save_index(&tables.tf, &tables.idf, &tables.tfidf, &meta)?;
    tracing::info!(root = %store.paths().root.display(), "index build complete");
    Ok(())
}

fn compute_ranks(store: &CorpusStore, config: &PageRankConfig) -> Result<()> {
    let docs = store.load_documents()?;
    let graph = WebGraph::from_documents(&docs);
    tracing::info!(nodes = graph.node_count(), edges = graph.edge_count(), sinks = graph.dangling().len(), "web graph built");
    let ranks = rank(&graph, config);
    store.save_ranks(&ranks.sorted_desc())?;
    tracing::info!(iterations = ranks.iterations, converged = ranks.converged, "ranks saved");
    Ok(())
}

fn run_search(store: &CorpusStore, query: Option<String>, batch_file: Option<String>, config: &RankerConfig) -> Result<()> {
    let meta = store.load_meta()?;
    if meta.version != STORE_VERSION {
        bail!("store version {} is not supported (expected {STORE_VERSION})", meta.version);
    }
    tracing::info!(num_docs = meta.num_docs, vocabulary = meta.vocabulary, built = %meta.created_at, "index loaded");
    let snapshot = store.load_snapshot()?;
    let start = std::time::Instant::now();
    match (query, batch_file) {
        (Some(q), _) => {
            for url in search(&q, &snapshot, config) {
                println!("{url}");
            }
        }
        (None, Some(path)) => {
            let batch = fs::read_to_string(&path)?;
            for (id, urls) in rank_batch(&batch, &snapshot.tfidf, &snapshot.ranks, config) {
                println!("# query {id}");
                for url in urls {
                    println!("{url}");
                }
            }
        }
        (None, None) => bail!("pass --query or --batch-file"),
    }
    tracing::info!(took_s = start.elapsed().as_secs_f64(), "search complete");
    Ok(())
}
