use serde::{Deserialize, Serialize};

/// Power-iteration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankConfig {
    /// Random-jump probability; `1 - epsilon` is the damping factor.
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Largest per-node change still treated as "unchanged".
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        PageRankConfig { epsilon: 0.15, max_iterations: 20, tolerance: 1e-10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Candidates kept after cosine ranking, before PageRank fusion.
    pub top_candidates: usize,
    /// URLs returned per query.
    pub top_final: usize,
    /// Companion query batched with a lone query so query-side IDF is not all zero.
    pub warmup_query: Option<String>,
}

pub const DEFAULT_WARMUP_QUERY: &str = "Computer Science Grad School";

impl Default for RankerConfig {
    fn default() -> Self {
        RankerConfig {
            top_candidates: 200,
            top_final: 10,
            warmup_query: Some(DEFAULT_WARMUP_QUERY.to_string()),
        }
    }
}
