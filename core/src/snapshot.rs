use crate::model::TfIdfTable;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only tables consulted at query time.
#[derive(Debug, Default)]
pub struct SearchSnapshot {
    pub tfidf: TfIdfTable,
    pub ranks: HashMap<String, f64>,
}

impl SearchSnapshot {
    pub fn num_docs(&self) -> usize { self.tfidf.len() }
}

/// Holds the last published snapshot. Readers take an `Arc` and never see a half-built table;
/// a rebuild swaps the whole snapshot in at once.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<SearchSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: SearchSnapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    pub fn load(&self) -> Arc<SearchSnapshot> { self.current.read().clone() }

    /// Publish a new snapshot, returning the one it replaced.
    pub fn publish(&self, snapshot: SearchSnapshot) -> Arc<SearchSnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_keep_their_snapshot_across_publish() {
        let cell = SnapshotCell::new(SearchSnapshot::default());
        let before = cell.load();
        let mut ranks = HashMap::new();
        ranks.insert("https://a.edu/".to_string(), 1.0);
        cell.publish(SearchSnapshot { tfidf: TfIdfTable::new(), ranks });
        assert!(before.ranks.is_empty());
        assert_eq!(cell.load().ranks.len(), 1);
    }
}
