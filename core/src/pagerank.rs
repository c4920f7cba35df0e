//! Link-importance scores over the crawled web graph.
//!
//! Each iteration reads only the previous snapshot, so nodes are computed in parallel and
//! the next iteration starts once the whole vector is collected.

use crate::config::PageRankConfig;
use crate::model::{NodeId, WebGraph};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PageRanks {
    pub scores: HashMap<String, f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl PageRanks {
    pub fn get(&self, url: &str) -> Option<f64> { self.scores.get(url).copied() }

    pub fn total(&self) -> f64 { self.scores.values().sum() }

    /// Highest score first; ties by URL.
    pub fn sorted_desc(&self) -> Vec<(String, f64)> {
        let mut v = self.sorted_asc();
        v.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        v
    }

    /// Lowest score first; ties by URL.
    pub fn sorted_asc(&self) -> Vec<(String, f64)> {
        let mut v: Vec<(String, f64)> = self.scores.iter().map(|(u, s)| (u.clone(), *s)).collect();
        v.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        v
    }
}

/// Run damped power iteration until the scores stop moving or the iteration cap is hit.
pub fn rank(graph: &WebGraph, config: &PageRankConfig) -> PageRanks {
    let n = graph.node_count();
    if n == 0 {
        return PageRanks { converged: true, ..Default::default() };
    }
    let incoming = graph.incoming();
    let out_degree: Vec<usize> = (0..n as NodeId).map(|id| graph.out_degree(id)).collect();
    let dangling = graph.dangling();

    let mut scores = vec![1.0 / n as f64; n];
    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iterations {
        let next = step(&scores, &incoming, &out_degree, &dangling, config.epsilon);
        iterations += 1;
        let delta = max_delta(&scores, &next);
        scores = next;
        tracing::debug!(iteration = iterations, delta, "pagerank iteration");
        if delta <= config.tolerance {
            converged = true;
            break;
        }
    }
    tracing::info!(nodes = n, edges = graph.edge_count(), iterations, converged, "pagerank finished");

    let scores = graph.urls().iter().cloned().zip(scores).collect();
    PageRanks { scores, iterations, converged }
}

/// One iteration: `eps/N + (1-eps) * (dangling/N + sum(prev[m] / out(m)))`.
/// Dangling mass is spread over every node so the total stays at 1.
fn step(prev: &[f64], incoming: &[Vec<NodeId>], out_degree: &[usize], dangling: &[NodeId], epsilon: f64) -> Vec<f64> {
    let n = prev.len() as f64;
    let dangling_mass: f64 = dangling.iter().map(|&d| prev[d as usize]).sum();
    let base = epsilon / n + (1.0 - epsilon) * dangling_mass / n;
    incoming
        .par_iter()
        .map(|sources| {
            let inflow: f64 = sources.iter().map(|&m| prev[m as usize] / out_degree[m as usize] as f64).sum();
            base + (1.0 - epsilon) * inflow
        })
        .collect()
}

fn max_delta(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}
