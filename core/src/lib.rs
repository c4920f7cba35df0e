//! Shared pieces of the search pipeline: text normalization, the document and graph model,
//! TF-IDF indexing, PageRank, query ranking and the on-disk corpus store.

pub mod config;
pub mod index;
pub mod model;
pub mod pagerank;
pub mod persist;
pub mod query;
pub mod snapshot;
pub mod tokenizer;

pub use config::{PageRankConfig, RankerConfig};
pub use index::{build_index, IndexTables};
pub use model::{DocId, Document, IdfTable, NodeId, TermWeights, TfIdfTable, TfTable, WebGraph};
pub use pagerank::PageRanks;
pub use persist::{CorpusStore, CrawlReport, MetaFile};
pub use snapshot::{SearchSnapshot, SnapshotCell};
