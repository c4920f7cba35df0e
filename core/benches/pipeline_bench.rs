use criterion::{criterion_group, criterion_main, Criterion};
use pagesearch_core::pagerank::rank;
use pagesearch_core::tokenizer::{tokenize, word_counts};
use pagesearch_core::{build_index, Document, PageRankConfig, WebGraph};

const TEXT: &str = "Graduate admissions in computer science cover research areas such as \
    robotics, databases, networking and machine learning. Applicants submit transcripts, \
    statements and letters before the published deadlines.";

fn synthetic_corpus(n: u32) -> Vec<Document> {
    (0..n)
        .map(|i| Document {
            id: i,
            url: format!("https://site.edu/p{i}"),
            outgoing_links: (1..=5).map(|k| format!("https://site.edu/p{}", (i * 7 + k * 13) % (n + 20))).collect(),
            word_counts: word_counts(&format!("{TEXT} page{} topic{}", i, i % 17)),
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_index(c: &mut Criterion) {
    let docs = synthetic_corpus(1_000);
    c.bench_function("build_index_1k", |b| b.iter(|| build_index(&docs)));
}

fn bench_pagerank(c: &mut Criterion) {
    let graph = WebGraph::from_documents(&synthetic_corpus(5_000));
    let config = PageRankConfig::default();
    c.bench_function("pagerank_5k", |b| b.iter(|| rank(&graph, &config)));
}

criterion_group!(benches, bench_tokenize, bench_index, bench_pagerank);
criterion_main!(benches);
