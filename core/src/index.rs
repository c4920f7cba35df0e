use crate::model::{Document, IdfTable, TermWeights, TfIdfTable, TfTable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// TF, IDF and TF-IDF tables for one corpus, keyed by `K` (URL for documents,
/// query id for a query batch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tables<K: Eq + Hash> {
    pub tf: HashMap<K, TermWeights>,
    pub idf: IdfTable,
    pub tfidf: HashMap<K, TermWeights>,
}

/// Document-side tables keyed by URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexTables {
    pub tf: TfTable,
    pub idf: IdfTable,
    pub tfidf: TfIdfTable,
}

impl From<Tables<String>> for IndexTables {
    fn from(t: Tables<String>) -> Self {
        Self { tf: t.tf, idf: t.idf, tfidf: t.tfidf }
    }
}

/// Build TF, IDF and TF-IDF over every crawled document.
pub fn build_index(documents: &[Document]) -> IndexTables {
    let rows: Vec<(String, &HashMap<String, u32>)> =
        documents.iter().map(|d| (d.url.clone(), &d.word_counts)).collect();
    let tables: IndexTables = build_tables(&rows).into();
    tracing::info!(
        num_docs = documents.len(),
        vocabulary = tables.idf.len(),
        "built tf-idf tables"
    );
    tables
}

/// Core of the indexer, shared with the query path so both sides use one pipeline.
pub fn build_tables<K, C>(rows: &[(K, C)]) -> Tables<K>
where
    K: Eq + Hash + Clone + Send + Sync,
    C: Borrow<HashMap<String, u32>> + Sync,
{
    let tf: HashMap<K, TermWeights> = rows
        .par_iter()
        .map(|(key, counts)| (key.clone(), term_frequencies(word_map(counts))))
        .collect();
    let all: Vec<&HashMap<String, u32>> = rows.iter().map(|(_, c)| word_map(c)).collect();
    let df = document_frequencies(&all);
    let idf = inverse_document_frequencies(&df, rows.len());
    let tfidf = tf
        .par_iter()
        .map(|(key, row)| (key.clone(), weigh(row, &idf)))
        .collect();
    Tables { tf, idf, tfidf }
}

fn word_map<C: Borrow<HashMap<String, u32>>>(c: &C) -> &HashMap<String, u32> {
    c.borrow()
}

/// `count / total` for each word with a positive count. Empty when the row has no words.
pub fn term_frequencies(counts: &HashMap<String, u32>) -> TermWeights {
    let total: u64 = counts.values().map(|&c| c as u64).sum();
    if total == 0 {
        return TermWeights::new();
    }
    counts
        .iter()
        .filter(|(_, &c)| c > 0)
        .map(|(w, &c)| (w.clone(), c as f64 / total as f64))
        .collect()
}

/// Number of rows containing each word, over the whole corpus.
/// Each rayon partition accumulates its own map; partitions are merged at the end.
pub fn document_frequencies(rows: &[&HashMap<String, u32>]) -> HashMap<String, u32> {
    rows.par_iter()
        .fold(HashMap::new, |mut acc: HashMap<String, u32>, counts| {
            for (word, &c) in counts.iter() {
                if c > 0 {
                    *acc.entry(word.clone()).or_insert(0) += 1;
                }
            }
            acc
        })
        .reduce(HashMap::new, |mut left, right| {
            if left.len() < right.len() {
                return merge_into(right, left);
            }
            for (word, n) in right {
                *left.entry(word).or_insert(0) += n;
            }
            left
        })
}

fn merge_into(mut big: HashMap<String, u32>, small: HashMap<String, u32>) -> HashMap<String, u32> {
    for (word, n) in small {
        *big.entry(word).or_insert(0) += n;
    }
    big
}

pub fn inverse_document_frequencies(df: &HashMap<String, u32>, total_docs: usize) -> IdfTable {
    df.iter()
        .filter(|(_, &n)| n > 0)
        .map(|(w, &n)| (w.clone(), (total_docs as f64 / n as f64).ln()))
        .collect()
}

/// Multiply a TF row by IDF. Words without an IDF entry are left out of the row.
pub fn weigh(tf: &TermWeights, idf: &IdfTable) -> TermWeights {
    let mut out = TermWeights::with_capacity(tf.len());
    for (word, &freq) in tf {
        match idf.get(word) {
            Some(&w) => {
                out.insert(word.clone(), freq * w);
            }
            None => tracing::debug!(word = %word, "no idf entry, weight treated as zero"),
        }
    }
    out
}
