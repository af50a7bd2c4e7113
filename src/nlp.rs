//! Cheap text features stored alongside articles.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::keywords::stopwords::is_stop_word;

pub const EMBEDDING_DIMENSIONS: usize = 384;
const SIMPLE_KEYWORD_COUNT: usize = 10;

/// Deterministic pseudo-embedding: the 32 bytes of the SHA-256 digest scaled
/// to `0.0..=1.0`, zero-padded to [`EMBEDDING_DIMENSIONS`].
pub fn embed(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut embedding: Vec<f32> = digest.iter().map(|b| *b as f32 / 255.0).collect();
    embedding.resize(EMBEDDING_DIMENSIONS, 0.0);
    embedding
}

/// The ten most frequent non-stop-word tokens, ties broken by first occurrence.
pub fn simple_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, token) in lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 2 && !is_stop_word(t))
        .enumerate()
    {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(SIMPLE_KEYWORD_COUNT)
        .map(|(token, _)| token.to_string())
        .collect()
}
