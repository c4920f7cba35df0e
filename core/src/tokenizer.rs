use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::{HashMap, HashSet};

/// Tokens shorter than this (after stemming) carry no signal and are dropped.
pub const MIN_TOKEN_LEN: usize = 3;

/// Literal terminator separating queries inside a batch.
pub const QUERY_TERMINATOR: char = '.';

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into normalized terms using NFKC normalization, lowercase, stopword removal,
/// stemming, and a minimum length filter. Term order follows the source text.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for mat in RE.find_iter(&normalized) {
        let token = mat.as_str();
        if is_stopword(token) { continue; }
        let stem = STEMMER.stem(token);
        // stemming can surface a stopword ("doing" -> "do")
        if stem.chars().count() < MIN_TOKEN_LEN || is_stopword(&stem) { continue; }
        tokens.push(stem.into_owned());
    }
    tokens
}

/// Occurrence count of every normalized term in `text`.
pub fn word_counts(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Split a free-text batch into individual queries on the `.` terminator.
/// Blank units are dropped; the text after the last terminator counts as a query too.
pub fn split_queries(batch: &str) -> Vec<String> {
    batch
        .split(QUERY_TERMINATOR)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn counts_repeated_terms() {
        let counts = word_counts("graph graph crawler");
        assert_eq!(counts.get("graph"), Some(&2));
        assert_eq!(counts.get("crawler"), Some(&1));
    }

    #[test]
    fn split_drops_blank_units() {
        let q = split_queries("computer science. . graduate school.");
        assert_eq!(q, vec!["computer science".to_string(), "graduate school".to_string()]);
    }

    #[test]
    fn unterminated_tail_is_a_query() {
        assert_eq!(split_queries("alpha. beta"), vec!["alpha".to_string(), "beta".to_string()]);
    }
}
