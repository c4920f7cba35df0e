use crate::model::{Document, IdfTable, TfIdfTable, TfTable};
use crate::snapshot::SearchSnapshot;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub vocabulary: u32,
    pub created_at: String,
    pub version: u32,
}

/// What the crawler could not turn into documents.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub seed: String,
    pub unknown_anchors: Vec<String>,
    pub broken_urls: Vec<String>,
    pub skipped_urls: Vec<String>,
    pub pending: Vec<String>,
}

pub struct CorpusPaths {
    pub root: PathBuf,
}

impl CorpusPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.jsonl") }
    pub fn crawl_report(&self) -> PathBuf { self.root.join("crawl_report.json") }
    pub fn tf(&self) -> PathBuf { self.root.join("tf.bin") }
    pub fn idf(&self) -> PathBuf { self.root.join("idf.bin") }
    pub fn tfidf(&self) -> PathBuf { self.root.join("tfidf.bin") }
    pub fn ranks(&self) -> PathBuf { self.root.join("ranks.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Durable home of documents, the crawl report and the whole-table index snapshots.
///
/// Every file is written to a sibling temp file and renamed into place, so a reader sees
/// either the previous table or the new one. Writes from one process go through `write_lock`.
pub struct CorpusStore {
    paths: CorpusPaths,
    write_lock: Mutex<()>,
}

impl CorpusStore {
    /// Open (creating if needed) the store directory. Failure here is fatal for the caller.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = CorpusPaths::new(root);
        create_dir_all(&paths.root)
            .with_context(|| format!("cannot create store directory {}", paths.root.display()))?;
        Ok(Self { paths, write_lock: Mutex::new(()) })
    }

    pub fn paths(&self) -> &CorpusPaths { &self.paths }

    pub fn save_documents(&self, docs: &[Document]) -> Result<()> {
        let _guard = self.write_lock.lock();
        write_atomic(&self.paths.documents(), |out| {
            for doc in docs {
                serde_json::to_writer(&mut *out, doc)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        })
    }

    /// Documents in id order.
    pub fn load_documents(&self) -> Result<Vec<Document>> {
        let path = self.paths.documents();
        let f = File::open(&path).with_context(|| format!("no documents at {}", path.display()))?;
        let mut docs = Vec::new();
        for (n, line) in BufReader::new(f).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let doc: Document = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}: malformed document", path.display(), n + 1))?;
            docs.push(doc);
        }
        docs.sort_by_key(|d| d.id);
        Ok(docs)
    }

    pub fn save_crawl_report(&self, report: &CrawlReport) -> Result<()> {
        let _guard = self.write_lock.lock();
        save_json(&self.paths.crawl_report(), report)
    }

    pub fn load_crawl_report(&self) -> Result<CrawlReport> {
        load_json(&self.paths.crawl_report())
    }

    pub fn save_index(&self, tf: &TfTable, idf: &IdfTable, tfidf: &TfIdfTable, meta: &MetaFile) -> Result<()> {
        let _guard = self.write_lock.lock();
        save_bin(&self.paths.tf(), tf)?;
        save_bin(&self.paths.idf(), idf)?;
        save_bin(&self.paths.tfidf(), tfidf)?;
        save_json(&self.paths.meta(), meta)
    }

    pub fn load_tf(&self) -> Result<TfTable> { load_bin(&self.paths.tf()) }
    pub fn load_idf(&self) -> Result<IdfTable> { load_bin(&self.paths.idf()) }
    pub fn load_tfidf(&self) -> Result<TfIdfTable> { load_bin(&self.paths.tfidf()) }
    pub fn load_meta(&self) -> Result<MetaFile> { load_json(&self.paths.meta()) }

    /// Persist ranks as (url, score) pairs in the given presentation order.
    pub fn save_ranks(&self, ranks: &[(String, f64)]) -> Result<()> {
        let _guard = self.write_lock.lock();
        save_json(&self.paths.ranks(), &ranks)
    }

    pub fn load_ranks(&self) -> Result<HashMap<String, f64>> {
        let pairs: Vec<(String, f64)> = load_json(&self.paths.ranks())?;
        Ok(pairs.into_iter().collect())
    }

    /// Load only what query serving needs.
    pub fn load_snapshot(&self) -> Result<SearchSnapshot> {
        let tfidf = self.load_tfidf()?;
        let ranks = self.load_ranks()?;
        Ok(SearchSnapshot { tfidf, ranks })
    }
}

fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = path.with_extension("tmp");
    {
        let mut out = BufWriter::new(File::create(&tmp)?);
        fill(&mut out)?;
        out.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("cannot publish {}", path.display()))?;
    Ok(())
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    write_atomic(path, |out| {
        out.write_all(&bytes)?;
        Ok(())
    })
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = bincode::deserialize(&buf)?;
    Ok(value)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, |out| {
        out.write_all(json.as_bytes())?;
        Ok(())
    })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let value = serde_json::from_str(&buf)?;
    Ok(value)
}
