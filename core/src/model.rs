use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;
pub type NodeId = u32;

/// Word weights of one row (a document or a query).
pub type TermWeights = HashMap<String, f64>;
/// url -> (word -> count / total words)
pub type TfTable = HashMap<String, TermWeights>;
/// word -> ln(total docs / doc frequency)
pub type IdfTable = HashMap<String, f64>;
/// url -> (word -> tf * idf)
pub type TfIdfTable = HashMap<String, TermWeights>;

/// A crawled page, written once by the crawler and read by every later stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "INDEX")]
    pub id: DocId,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "OUTGOING_LINKS")]
    pub outgoing_links: Vec<String>,
    #[serde(rename = "WORD_COUNT_MAP")]
    pub word_counts: HashMap<String, u32>,
}

impl Document {
    pub fn total_words(&self) -> u64 {
        self.word_counts.values().map(|&c| c as u64).sum()
    }
}

/// Link graph over interned URLs. Node ids are dense indices into `urls` and `out`.
///
/// Targets that were never crawled are still nodes: they have an empty adjacency row
/// and behave as sinks.
#[derive(Debug, Clone, Default)]
pub struct WebGraph {
    urls: Vec<String>,
    ids: HashMap<String, NodeId>,
    out: Vec<Vec<NodeId>>,
}

impl WebGraph {
    pub fn new() -> Self { Self::default() }

    /// Build the graph from crawled documents in id order.
    pub fn from_documents(docs: &[Document]) -> Self {
        let mut ordered: Vec<&Document> = docs.iter().collect();
        ordered.sort_by_key(|d| d.id);
        let mut graph = Self::new();
        for doc in ordered {
            graph.add_page(&doc.url, &doc.outgoing_links);
        }
        graph
    }

    /// Build from an ordered adjacency list of (source, targets).
    pub fn from_adjacency<S: AsRef<str>>(rows: &[(S, Vec<S>)]) -> Self {
        let mut graph = Self::new();
        for (src, targets) in rows {
            graph.add_page(src.as_ref(), targets);
        }
        graph
    }

    /// Register a fetched page and its outgoing links. Calling twice for the same URL
    /// appends to the existing row.
    pub fn add_page<S: AsRef<str>>(&mut self, url: &str, links: &[S]) {
        let src = self.intern(url);
        for link in links {
            let dst = self.intern(link.as_ref());
            self.out[src as usize].push(dst);
        }
    }

    fn intern(&mut self, url: &str) -> NodeId {
        if let Some(&id) = self.ids.get(url) {
            return id;
        }
        let id = self.urls.len() as NodeId;
        self.urls.push(url.to_string());
        self.ids.insert(url.to_string(), id);
        self.out.push(Vec::new());
        id
    }

    pub fn node_count(&self) -> usize { self.urls.len() }

    pub fn edge_count(&self) -> usize { self.out.iter().map(Vec::len).sum() }

    pub fn is_empty(&self) -> bool { self.urls.is_empty() }

    pub fn id(&self, url: &str) -> Option<NodeId> { self.ids.get(url).copied() }

    pub fn urls(&self) -> &[String] { &self.urls }

    pub fn out_degree(&self, id: NodeId) -> usize { self.out[id as usize].len() }

    /// Reverse adjacency. A source appears once per edge, so multi-links keep their weight.
    pub fn incoming(&self) -> Vec<Vec<NodeId>> {
        let mut incoming = vec![Vec::new(); self.urls.len()];
        for (src, targets) in self.out.iter().enumerate() {
            for &dst in targets {
                incoming[dst as usize].push(src as NodeId);
            }
        }
        incoming
    }

    /// Nodes with no outgoing links, including uncrawled targets.
    pub fn dangling(&self) -> Vec<NodeId> {
        (0..self.urls.len() as NodeId).filter(|&n| self.out[n as usize].is_empty()).collect()
    }

    /// String-keyed view: only nodes with outgoing links appear as keys.
    pub fn adjacency(&self) -> HashMap<String, Vec<String>> {
        self.out
            .iter()
            .enumerate()
            .filter(|(_, targets)| !targets.is_empty())
            .map(|(src, targets)| {
                let links = targets.iter().map(|&t| self.urls[t as usize].clone()).collect();
                (self.urls[src].clone(), links)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId, url: &str, links: &[&str]) -> Document {
        Document {
            id,
            url: url.into(),
            outgoing_links: links.iter().map(|s| s.to_string()).collect(),
            word_counts: HashMap::new(),
        }
    }

    #[test]
    fn uncrawled_targets_become_sinks() {
        let docs = vec![doc(0, "https://a.edu/", &["https://a.edu/x", "https://a.edu/y"])];
        let g = WebGraph::from_documents(&docs);
        assert_eq!(g.node_count(), 3);
        let x = g.id("https://a.edu/x").unwrap();
        assert_eq!(g.out_degree(x), 0);
        assert_eq!(g.dangling().len(), 2);
        let adj = g.adjacency();
        assert_eq!(adj.len(), 1);
        assert!(!adj.contains_key("https://a.edu/x"));
    }

    #[test]
    fn incoming_mirrors_edges() {
        let g = WebGraph::from_adjacency(&[("a", vec!["b", "c"]), ("b", vec!["c"])]);
        let inc = g.incoming();
        let c = g.id("c").unwrap();
        assert_eq!(inc[c as usize].len(), 2);
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn document_uses_persisted_field_names() {
        let mut d = doc(4, "https://a.edu/", &["https://a.edu/b"]);
        d.word_counts.insert("graph".into(), 2);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["INDEX"], 4);
        assert_eq!(json["URL"], "https://a.edu/");
        assert_eq!(json["OUTGOING_LINKS"][0], "https://a.edu/b");
        assert_eq!(json["WORD_COUNT_MAP"]["graph"], 2);
        assert_eq!(d.total_words(), 2);
    }
}
