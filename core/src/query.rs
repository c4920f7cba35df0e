//! Query-time ranking: cosine similarity against the TF-IDF table, then PageRank fusion.
//!
//! Query vectors go through the same tokenizer and TF/IDF pipeline as documents, but IDF is
//! computed over the queries of the batch, not over the crawled corpus. A batch of one query
//! therefore has IDF 0 for every term; [`search`] pairs a lone query with a warmup query.

use crate::config::RankerConfig;
use crate::index::{build_tables, Tables};
use crate::model::{TermWeights, TfIdfTable};
use crate::snapshot::SearchSnapshot;
use crate::tokenizer::{split_queries, word_counts, QUERY_TERMINATOR};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// 1-based position of a query within its batch.
pub type QueryId = u32;

/// Why a (query, document) pair was left unscored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("query and document share no terms")]
    NoSharedTerms,
    #[error("vector has zero norm")]
    ZeroNorm,
}

pub fn norm(v: &TermWeights) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Dot product over shared terms divided by the product of the full-vector norms.
pub fn cosine_similarity(query: &TermWeights, doc: &TermWeights) -> Result<f64, ScoreError> {
    let (small, large) = if query.len() <= doc.len() { (query, doc) } else { (doc, query) };
    let mut shared = 0usize;
    let mut dot = 0.0;
    for (word, a) in small {
        if let Some(b) = large.get(word) {
            shared += 1;
            dot += a * b;
        }
    }
    if shared == 0 {
        return Err(ScoreError::NoSharedTerms);
    }
    let denom = norm(query) * norm(doc);
    if denom == 0.0 {
        return Err(ScoreError::ZeroNorm);
    }
    Ok(dot / denom)
}

/// TF, IDF and TF-IDF for a batch of queries, keyed by 1-based query id.
pub fn query_tables(queries: &[String]) -> Tables<QueryId> {
    let rows: Vec<(QueryId, HashMap<String, u32>)> = queries
        .iter()
        .enumerate()
        .map(|(i, q)| ((i + 1) as QueryId, word_counts(q)))
        .collect();
    build_tables(&rows)
}

/// Documents most similar to `query`, best first, at most `limit`.
/// Pairs with no shared term or a zero norm are excluded.
pub fn top_candidates(query: &TermWeights, tfidf: &TfIdfTable, limit: usize) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = tfidf
        .par_iter()
        .filter_map(|(url, doc)| cosine_similarity(query, doc).ok().map(|s| (url.clone(), s)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored
}

/// Reorder candidates by PageRank and keep the best `top_final` URLs.
/// A candidate missing from the rank table scores 0.
pub fn fuse_with_pagerank(candidates: Vec<(String, f64)>, ranks: &HashMap<String, f64>, top_final: usize) -> Vec<String> {
    let mut fused: Vec<(String, f64, f64)> = candidates
        .into_iter()
        .map(|(url, sim)| {
            let pr = ranks.get(&url).copied().unwrap_or(0.0);
            (url, sim, pr)
        })
        .collect();
    fused.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
            .then_with(|| a.0.cmp(&b.0))
    });
    fused.into_iter().take(top_final).map(|(url, _, _)| url).collect()
}

/// Rank every query of the batch. Every query id gets an entry; no match means an empty list.
pub fn rank_queries(
    queries: &[String],
    tfidf: &TfIdfTable,
    ranks: &HashMap<String, f64>,
    config: &RankerConfig,
) -> BTreeMap<QueryId, Vec<String>> {
    let tables = query_tables(queries);
    (1..=queries.len() as QueryId)
        .into_par_iter()
        .map(|id| {
            let urls = match tables.tfidf.get(&id) {
                Some(vector) if !vector.is_empty() => {
                    let candidates = top_candidates(vector, tfidf, config.top_candidates);
                    tracing::debug!(query = id, candidates = candidates.len(), "cosine candidates");
                    fuse_with_pagerank(candidates, ranks, config.top_final)
                }
                _ => Vec::new(),
            };
            (id, urls)
        })
        .collect()
}

/// Rank a free-text batch whose queries are separated by `.`.
pub fn rank_batch(
    batch: &str,
    tfidf: &TfIdfTable,
    ranks: &HashMap<String, f64>,
    config: &RankerConfig,
) -> BTreeMap<QueryId, Vec<String>> {
    rank_queries(&split_queries(batch), tfidf, ranks, config)
}

/// Serve one user query against a published snapshot.
pub fn search(query: &str, snapshot: &SearchSnapshot, config: &RankerConfig) -> Vec<String> {
    let query = query.replace(QUERY_TERMINATOR, " ");
    if query.trim().is_empty() {
        return Vec::new();
    }
    let mut batch: Vec<String> = config
        .warmup_query
        .iter()
        .map(|w| w.replace(QUERY_TERMINATOR, " "))
        .filter(|w| !w.trim().is_empty())
        .collect();
    batch.push(query.trim().to_string());
    let user_id = batch.len() as QueryId;
    let mut results = rank_queries(&batch, &snapshot.tfidf, &snapshot.ranks, config);
    results.remove(&user_id).unwrap_or_default()
}
