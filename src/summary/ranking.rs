//! Sentence-ranking summarizers: TextRank over a word-overlap graph and LSA
//! over a term/sentence matrix.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use super::fallback;
use crate::keywords::stopwords::is_stop_word;
use crate::outcome::Outcome;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const EPSILON: f64 = 1e-4;
const LSA_DIMENSIONS: usize = 3;

pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn content_words(sentence: &str) -> Vec<String> {
    sentence
        .unicode_words()
        .map(str::to_lowercase)
        .filter(|w| !is_stop_word(w))
        .collect()
}

/// Number of sentences to keep, chosen by document size bucket.
pub fn sentence_count(char_len: usize, sentences: usize) -> usize {
    let n = sentences;
    let count = if char_len <= 100 {
        (n / 10).min(2).max(1)
    } else if char_len <= 300 {
        ((n as f64 * 0.15) as usize).min(5).max(2)
    } else if char_len <= 600 {
        ((n as f64 * 0.3) as usize).min(10).max(3)
    } else {
        ((n as f64 * 0.6) as usize).min(n.saturating_sub(1)).max(5)
    };
    count.min(n.saturating_sub(1)).max(1)
}

/// Cut to at most `limit` characters, backing up to the last space.
pub(crate) fn cut_at_word(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    match head.rfind(' ') {
        Some(idx) if idx > 0 => head[..idx].trim_end().to_string(),
        _ => head,
    }
}

/// Short targets are strict; long targets tolerate up to twice the length.
fn apply_length_policy(selected: &[&str], max_length: usize) -> String {
    let summary = selected.join(" ");
    let len = summary.chars().count();
    let max = max_length as f64;

    if max_length <= 200 && len as f64 > max * 1.2 {
        let first = selected.first().copied().unwrap_or_default();
        if first.chars().count() > max_length {
            format!("{}...", cut_at_word(first, max_length))
        } else {
            first.to_string()
        }
    } else if max_length > 200 && len as f64 > max * 2.0 {
        format!("{}...", cut_at_word(&summary, (max * 1.8) as usize))
    } else {
        summary
    }
}

/// Indices of the `count` best-scored sentences, in document order.
fn top_in_order(scores: &[f64], count: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    ranked.truncate(count);
    ranked.sort_unstable();
    ranked
}

fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let overlap = a.intersection(b).count() as f64;
    let norm = (a.len() as f64).ln() + (b.len() as f64).ln();
    if norm <= 0.0 {
        overlap
    } else {
        overlap / norm
    }
}

fn pagerank(weights: &[Vec<f64>]) -> Vec<f64> {
    let n = weights.len();
    let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
    let mut scores = vec![1.0 / n as f64; n];

    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![(1.0 - DAMPING) / n as f64; n];
        for (j, row) in weights.iter().enumerate() {
            if out_weight[j] <= 0.0 {
                continue;
            }
            for (i, w) in row.iter().enumerate() {
                if *w > 0.0 {
                    next[i] += DAMPING * w / out_weight[j] * scores[j];
                }
            }
        }
        let delta = next
            .iter()
            .zip(&scores)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        scores = next;
        if delta < EPSILON {
            break;
        }
    }
    scores
}

/// Sentence-ranking strategy for length-bounded summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMethod {
    #[default]
    TextRank,
    Lsa,
}

impl RankingMethod {
    pub fn name(self) -> &'static str {
        match self {
            RankingMethod::TextRank => "textrank",
            RankingMethod::Lsa => "lsa",
        }
    }

    pub fn summarize(self, text: &str, max_length: usize) -> Outcome<String> {
        match self {
            RankingMethod::TextRank => textrank(text, max_length),
            RankingMethod::Lsa => lsa(text, max_length),
        }
    }
}

/// TextRank summary. Documents of two sentences or fewer come back as-is.
pub fn textrank(text: &str, max_length: usize) -> Outcome<String> {
    let text = text.trim();
    let sentences = split_sentences(text);
    let n = sentences.len();
    if n <= 2 {
        return Outcome::Full(text.to_string());
    }

    let bags: Vec<HashSet<String>> = sentences
        .iter()
        .map(|s| content_words(s).into_iter().collect())
        .collect();
    let weights: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.0 } else { similarity(&bags[i], &bags[j]) })
                .collect()
        })
        .collect();

    let scores = pagerank(&weights);
    if scores.iter().any(|s| !s.is_finite()) {
        return Outcome::degraded(
            fallback::truncate(text, max_length),
            "textrank produced non-finite scores",
        );
    }

    let count = sentence_count(text.chars().count(), n);
    let selected: Vec<&str> = top_in_order(&scores, count)
        .into_iter()
        .map(|i| sentences[i])
        .collect();

    Outcome::Full(apply_length_policy(&selected, max_length))
}

/// Dominant eigenpairs of a symmetric matrix by power iteration with deflation.
fn eigen_decompose(mut matrix: Vec<Vec<f64>>, k: usize) -> Vec<(f64, Vec<f64>)> {
    let n = matrix.len();
    let mut pairs = Vec::with_capacity(k);

    for _ in 0..k {
        let mut v: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 / n as f64).collect();
        let mut lambda = 0.0;

        for _ in 0..MAX_ITERATIONS {
            let mut w: Vec<f64> = matrix
                .iter()
                .map(|row| row.iter().zip(&v).map(|(a, b)| a * b).sum())
                .collect();
            let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm < 1e-12 {
                lambda = 0.0;
                break;
            }
            w.iter_mut().for_each(|x| *x /= norm);
            let converged = w.iter().zip(&v).all(|(a, b)| (a - b).abs() < 1e-9);
            v = w;
            lambda = norm;
            if converged {
                break;
            }
        }

        if lambda <= 1e-12 {
            break;
        }
        for i in 0..n {
            for j in 0..n {
                matrix[i][j] -= lambda * v[i] * v[j];
            }
        }
        pairs.push((lambda, v));
    }

    pairs
}

/// Latent semantic analysis summary, cut to `max_length` characters.
pub fn lsa(text: &str, max_length: usize) -> Outcome<String> {
    let text = text.trim();
    let sentences = split_sentences(text);
    let n = sentences.len();
    if n <= 2 {
        return Outcome::Full(text.to_string());
    }

    let mut vocabulary: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<HashMap<usize, f64>> = Vec::with_capacity(n);
    for sentence in &sentences {
        let mut column = HashMap::new();
        for word in content_words(sentence) {
            let next_id = vocabulary.len();
            let id = *vocabulary.entry(word).or_insert(next_id);
            *column.entry(id).or_insert(0.0) += 1.0;
        }
        columns.push(column);
    }

    // Gram matrix A^T A of the term/sentence matrix: its eigenvalues are the
    // squared singular values and its eigenvectors the right singular vectors.
    let gram: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    columns[i]
                        .iter()
                        .filter_map(|(term, a)| columns[j].get(term).map(|b| a * b))
                        .sum()
                })
                .collect()
        })
        .collect();

    let pairs = eigen_decompose(gram, LSA_DIMENSIONS.min(n));
    if pairs.is_empty() {
        return Outcome::degraded(
            fallback::truncate(text, max_length),
            "no content terms to rank",
        );
    }

    let scores: Vec<f64> = (0..n)
        .map(|j| {
            pairs
                .iter()
                .map(|(sigma_sq, v)| sigma_sq * v[j] * v[j])
                .sum::<f64>()
                .sqrt()
        })
        .collect();

    let avg_len = (text.chars().count() / n).max(1);
    let count = (n / 3).min(max_length / avg_len).max(1);
    let selected: Vec<&str> = top_in_order(&scores, count)
        .into_iter()
        .map(|i| sentences[i])
        .collect();

    Outcome::Full(cut_at_word(&selected.join(" "), max_length))
}
