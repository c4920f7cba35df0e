use pagesearch_core::pagerank::rank;
use pagesearch_core::persist::{CorpusStore, CrawlReport, MetaFile};
use pagesearch_core::query::{rank_batch, search};
use pagesearch_core::tokenizer::word_counts;
use pagesearch_core::{build_index, Document, PageRankConfig, RankerConfig, WebGraph};
use tempfile::tempdir;

fn page(id: u32, url: &str, links: &[&str], text: &str) -> Document {
    Document {
        id,
        url: url.to_string(),
        outgoing_links: links.iter().map(|s| s.to_string()).collect(),
        word_counts: word_counts(text),
    }
}

fn corpus() -> Vec<Document> {
    vec![
        page(0, "https://cs.uni.edu/", &["https://cs.uni.edu/grad", "https://cs.uni.edu/news"], "department home research faculty"),
        page(1, "https://cs.uni.edu/grad", &["https://cs.uni.edu/"], "graduate admissions deadlines research"),
        page(2, "https://cs.uni.edu/news", &["https://cs.uni.edu/", "https://cs.uni.edu/grad"], "news robotics research awards"),
        page(3, "https://cs.uni.edu/robots", &["https://cs.uni.edu/news"], "robotics laboratory robotics projects"),
    ]
}

#[test]
fn tf_rows_are_distributions() {
    let tables = build_index(&corpus());
    for (url, row) in &tables.tf {
        let sum: f64 = row.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "{url}");
    }
}

#[test]
fn tfidf_only_holds_document_words() {
    let docs = corpus();
    let tables = build_index(&docs);
    for doc in &docs {
        for word in tables.tfidf[&doc.url].keys() {
            assert!(doc.word_counts.contains_key(word));
        }
    }
    assert!(!tables.tfidf["https://cs.uni.edu/grad"].contains_key("robot"));
}

#[test]
fn pagerank_over_crawl_graph_sums_to_one() {
    let mut docs = corpus();
    docs[3].outgoing_links.push("https://cs.uni.edu/never-crawled".into());
    let graph = WebGraph::from_documents(&docs);
    assert_eq!(graph.node_count(), 5);
    let ranks = rank(&graph, &PageRankConfig::default());
    assert!((ranks.total() - 1.0).abs() < 1e-9);
    assert!(ranks.get("https://cs.uni.edu/never-crawled").is_some());
}

#[test]
fn batch_ranking_prefers_linked_pages_among_matches() {
    let docs = corpus();
    let tables = build_index(&docs);
    let ranks = rank(&WebGraph::from_documents(&docs), &PageRankConfig::default());
    let out = rank_batch("robotics projects. graduate admissions.", &tables.tfidf, &ranks.scores, &RankerConfig::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[&1], vec!["https://cs.uni.edu/news".to_string(), "https://cs.uni.edu/robots".to_string()]);
    assert_eq!(out[&2], vec!["https://cs.uni.edu/grad".to_string()]);
}

#[test]
fn unmatched_query_returns_empty_list() {
    let docs = corpus();
    let tables = build_index(&docs);
    let out = rank_batch("zebra. quantum.", &tables.tfidf, &Default::default(), &RankerConfig::default());
    assert!(out.values().all(Vec::is_empty));
}

#[test]
fn store_round_trip_and_search() {
    let dir = tempdir().unwrap();
    let store = CorpusStore::open(dir.path()).unwrap();
    let docs = corpus();
    store.save_documents(&docs).unwrap();
    assert_eq!(store.load_documents().unwrap(), docs);

    let tables = build_index(&docs);
    let meta = MetaFile { num_docs: docs.len() as u32, vocabulary: tables.idf.len() as u32, created_at: String::new(), version: 1 };
    store.save_index(&tables.tf, &tables.idf, &tables.tfidf, &meta).unwrap();
    assert_eq!(store.load_idf().unwrap(), tables.idf);
    let stored = store.load_meta().unwrap();
    assert_eq!((stored.num_docs, stored.vocabulary), (4, tables.idf.len() as u32));
    let ranks = rank(&WebGraph::from_documents(&docs), &PageRankConfig::default());
    store.save_ranks(&ranks.sorted_desc()).unwrap();

    let snapshot = store.load_snapshot().unwrap();
    assert_eq!(snapshot.num_docs(), 4);
    let hits = search("robotics", &snapshot, &RankerConfig::default());
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|u| u.contains("news") || u.contains("robots")));

    let alone = RankerConfig { warmup_query: None, ..RankerConfig::default() };
    assert!(search("robotics", &snapshot, &alone).is_empty());
}

#[test]
fn crawl_report_round_trip() {
    let dir = tempdir().unwrap();
    let store = CorpusStore::open(dir.path()).unwrap();
    let report = CrawlReport {
        seed: "https://uni.edu/".into(),
        unknown_anchors: vec!["staff.html".into()],
        broken_urls: vec!["https://uni.edu/gone".into()],
        skipped_urls: vec![],
        pending: vec!["https://uni.edu/later".into()],
    };
    store.save_crawl_report(&report).unwrap();
    let loaded = store.load_crawl_report().unwrap();
    assert_eq!(loaded.seed, report.seed);
    assert_eq!(loaded.unknown_anchors, report.unknown_anchors);
    assert_eq!(loaded.broken_urls, report.broken_urls);
    assert!(loaded.skipped_urls.is_empty());
    assert_eq!(loaded.pending, report.pending);
}

#[test]
fn opening_store_under_a_file_fails() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain");
    std::fs::write(&file, b"x").unwrap();
    assert!(CorpusStore::open(file.join("store")).is_err());
}
