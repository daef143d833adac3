//! TF-IDF similarity over a two-document corpus

use crate::processing::stop_words::is_stop_word;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid token regex"));

/// Sparse L2-normalized TF-IDF vector keyed by term
pub type TermVector = BTreeMap<String, f64>;

/// Tokens of two or more word characters, lowercased, stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !is_stop_word(t))
        .collect()
}

fn term_counts(tokens: &[String]) -> BTreeMap<&str, f64> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Fit TF-IDF on exactly the given documents and return one vector per document.
///
/// Uses raw counts and smoothed idf, `ln((1 + n) / (1 + df)) + 1`.
pub fn tfidf_vectors(documents: &[&str]) -> Vec<TermVector> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();
    let counts: Vec<BTreeMap<&str, f64>> = tokenized.iter().map(|t| term_counts(t)).collect();

    let mut document_frequency: BTreeMap<&str, f64> = BTreeMap::new();
    for doc in &counts {
        for term in doc.keys() {
            *document_frequency.entry(*term).or_insert(0.0) += 1.0;
        }
    }

    let n = documents.len() as f64;
    counts
        .iter()
        .map(|doc| {
            let mut vector: TermVector = doc
                .iter()
                .map(|(term, tf)| {
                    let df = document_frequency[term];
                    let idf = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
                    (term.to_string(), tf * idf)
                })
                .collect();

            let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                vector.values_mut().for_each(|w| *w /= norm);
            }
            vector
        })
        .collect()
}

/// Cosine similarity of two sparse vectors, 0 when either is all-zero
pub fn sparse_cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// TF-IDF cosine between resume and job description, scaled to 0-100 with
/// two decimals. Each call builds its own corpus from just this pair.
pub fn lexical_similarity(resume_text: &str, jd_text: &str) -> f64 {
    let vectors = tfidf_vectors(&[resume_text, jd_text]);
    let similarity = sparse_cosine(&vectors[0], &vectors[1]).clamp(0.0, 1.0);
    round2(similarity * 100.0)
}
