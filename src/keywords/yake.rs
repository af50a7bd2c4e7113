//! YAKE keyword scoring.
//!
//! Every term is scored from features of the text itself: casing, position
//! of the sentences it appears in, frequency, how varied its neighbours are,
//! and how many sentences it spreads over. Candidates are unigrams and
//! bigrams without stop words; a lower raw score means a better keyword.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::stopwords::is_stop_word;
use super::{Keyword, Method};

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?\n]+").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

const MAX_NGRAM: usize = 2;

#[derive(Default)]
struct TermStats {
    count: usize,
    capitalized: usize,
    acronyms: usize,
    /// Sentence index of every occurrence, in text order.
    sentences: Vec<usize>,
    left: Vec<String>,
    right: Vec<String>,
}

fn is_candidate_word(lower: &str) -> bool {
    !is_stop_word(lower) && !lower.chars().all(|c| c.is_ascii_digit())
}

fn is_acronym(token: &str) -> bool {
    token.chars().count() > 1 && token.chars().all(|c| c.is_alphabetic() && c.is_uppercase())
}

/// Share of distinct words among the neighbours; 0 without neighbours.
fn dispersion(neighbours: &[String]) -> f64 {
    if neighbours.is_empty() {
        return 0.0;
    }
    let mut distinct: Vec<&String> = neighbours.iter().collect();
    distinct.sort();
    distinct.dedup();
    distinct.len() as f64 / neighbours.len() as f64
}

fn median(sorted: &[usize]) -> f64 {
    let k = sorted.len();
    if k % 2 == 1 {
        sorted[k / 2] as f64
    } else {
        (sorted[k / 2 - 1] + sorted[k / 2]) as f64 / 2.0
    }
}

fn tokenize(text: &str) -> Vec<Vec<&str>> {
    SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| TOKEN.find_iter(s).map(|m| m.as_str()).collect::<Vec<_>>())
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

fn term_scores(sentences: &[Vec<&str>]) -> HashMap<String, f64> {
    let mut stats: HashMap<String, TermStats> = HashMap::new();
    for (index, tokens) in sentences.iter().enumerate() {
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        for (i, token) in tokens.iter().enumerate() {
            if !is_candidate_word(&lower[i]) {
                continue;
            }
            let entry = stats.entry(lower[i].clone()).or_default();
            entry.count += 1;
            if is_acronym(token) {
                entry.acronyms += 1;
            } else if i > 0 && token.chars().next().is_some_and(char::is_uppercase) {
                entry.capitalized += 1;
            }
            entry.sentences.push(index);
            if i > 0 {
                entry.left.push(lower[i - 1].clone());
            }
            if let Some(next) = lower.get(i + 1) {
                entry.right.push(next.clone());
            }
        }
    }
    if stats.is_empty() {
        return HashMap::new();
    }

    let counts: Vec<f64> = stats.values().map(|s| s.count as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let std = (counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64).sqrt();
    let max_count = counts.iter().copied().fold(1.0, f64::max);
    let total_sentences = sentences.len() as f64;

    stats
        .into_iter()
        .map(|(term, s)| {
            let count = s.count as f64;
            let casing = s.capitalized.max(s.acronyms) as f64 / (1.0 + count.ln());

            let mut positions = s.sentences.clone();
            positions.sort_unstable();
            let position = (3.0 + median(&positions)).ln().ln();

            let frequency = count / (mean + std);
            let relatedness = 1.0 + (dispersion(&s.left) + dispersion(&s.right)) * count / max_count;

            positions.dedup();
            let spread = positions.len() as f64 / total_sentences;

            let score = relatedness * position
                / (casing + frequency / relatedness + spread / relatedness);
            (term, score)
        })
        .collect()
}

/// Up to `num` keywords, best first. Empty when the text has no usable terms.
pub fn extract(text: &str, num: usize) -> Vec<Keyword> {
    let sentences = tokenize(text);
    let scores = term_scores(&sentences);
    if scores.is_empty() {
        return Vec::new();
    }

    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for tokens in &sentences {
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        for n in 1..=MAX_NGRAM {
            for window in lower.windows(n) {
                if window.iter().all(|w| scores.contains_key(w)) {
                    *frequencies.entry(window.join(" ")).or_insert(0) += 1;
                }
            }
        }
    }

    let mut ranked: Vec<(String, f64)> = frequencies
        .into_iter()
        .map(|(candidate, tf)| {
            let parts: Vec<f64> = candidate.split(' ').map(|w| scores[w]).collect();
            let product: f64 = parts.iter().product();
            let sum: f64 = parts.iter().sum();
            let score = product / (tf as f64 * (1.0 + sum));
            (candidate, score)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(num)
        .map(|(candidate, score)| Keyword::new(candidate, 1.0 / (1.0 + score), Method::Yake))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The quarterly report covers solar energy. Solar capacity doubled this year. \
        Investors expect solar growth to continue. Storage costs also fell sharply.";

    #[test]
    fn favours_early_phrases() {
        let keywords = extract(TEXT, 5);
        assert_eq!(keywords.len(), 5);
        assert_eq!(keywords[0].keyword, "quarterly report");
        assert!(keywords.iter().any(|k| k.keyword == "solar energy"));
        assert!(keywords.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(keywords.iter().all(|k| k.method == Method::Yake));
    }

    #[test]
    fn candidates_skip_stop_words_and_numbers() {
        let keywords = extract("In 2024 the team shipped the new release to the customers.", 20);
        assert!(!keywords.is_empty());
        for k in &keywords {
            assert!(k.keyword.split(' ').all(is_candidate_word), "{}", k.keyword);
        }
    }

    #[test]
    fn nothing_from_stop_words_only() {
        assert!(extract("and the of it was", 5).is_empty());
    }

    #[test]
    fn neighbour_dispersion() {
        let words = |s: &[&str]| s.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        assert_eq!(dispersion(&[]), 0.0);
        assert_eq!(dispersion(&words(&["solar", "solar"])), 0.5);
        assert_eq!(dispersion(&words(&["wind", "solar"])), 1.0);
    }
}
