//! TF-IDF keyword scoring with sentences as the document collection.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::stopwords::is_stop_word;
use super::{Keyword, Method};

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Terms appearing in more than this share of sentences carry no signal.
const MAX_DOCUMENT_FREQUENCY: f64 = 0.8;
/// Vocabulary is capped at this many times the requested keyword count.
const VOCABULARY_FACTOR: usize = 3;

fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > 10)
        .collect()
}

/// Unigrams and bigrams of the non-stop-word tokens.
fn terms(sentence: &str) -> Vec<String> {
    let lower = sentence.to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

/// `None` when the text has fewer than two usable sentences, so the caller
/// can switch method. An empty list means every term was pruned.
pub fn extract(text: &str, num: usize) -> Option<Vec<Keyword>> {
    let docs = sentences(text);
    if docs.len() < 2 {
        return None;
    }
    let n = docs.len();

    let counts: Vec<HashMap<String, usize>> = docs
        .iter()
        .map(|doc| {
            let mut tf = HashMap::new();
            for term in terms(doc) {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    let mut corpus_frequency: HashMap<&str, usize> = HashMap::new();
    for tf in &counts {
        for (term, c) in tf {
            *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            *corpus_frequency.entry(term.as_str()).or_insert(0) += c;
        }
    }

    let max_df = MAX_DOCUMENT_FREQUENCY * n as f64;
    let mut vocabulary: Vec<&str> = document_frequency
        .iter()
        .filter(|(_, df)| **df as f64 <= max_df)
        .map(|(term, _)| *term)
        .collect();
    vocabulary.sort_by(|a, b| corpus_frequency[b].cmp(&corpus_frequency[a]).then(a.cmp(b)));
    vocabulary.truncate(num * VOCABULARY_FACTOR);

    let idf: HashMap<&str, f64> = vocabulary
        .iter()
        .map(|term| {
            let df = document_frequency[term] as f64;
            (*term, ((1.0 + n as f64) / (1.0 + df)).ln() + 1.0)
        })
        .collect();

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for tf in &counts {
        let row: Vec<(&str, f64)> = vocabulary
            .iter()
            .filter_map(|term| tf.get(*term).map(|c| (*term, *c as f64 * idf[term])))
            .collect();
        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, weight) in row {
            *totals.entry(term).or_insert(0.0) += weight / norm;
        }
    }

    let mut scored: Vec<(&str, f64)> = totals
        .into_iter()
        .map(|(term, total)| (term, total / n as f64))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));

    Some(
        scored
            .into_iter()
            .take(num)
            .map(|(term, score)| Keyword::new(term, score, Method::Tfidf))
            .collect(),
    )
}
