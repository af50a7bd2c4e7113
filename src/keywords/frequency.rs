use std::collections::HashMap;

use super::stopwords::is_stop_word;
use super::{Keyword, Method};

/// Counts in order of first appearance, so equal counts keep text order.
fn count_in_order(items: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts
}

fn most_common(mut counts: Vec<(String, usize)>, n: usize) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

/// Word and word-pair frequencies. Bigrams are weighted at 0.8 of a unigram
/// with the same relative frequency.
pub fn extract(text: &str, num: usize) -> Vec<Keyword> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && w.chars().all(char::is_alphabetic) && !is_stop_word(w))
        .collect();

    let unigrams = count_in_order(words.iter().map(|w| w.to_string()));
    let bigrams = count_in_order(
        words
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .filter(|b| b.chars().count() > 5),
    );

    let max_unigram = unigrams.iter().map(|(_, n)| *n).max().unwrap_or(1) as f64;
    let max_bigram = bigrams.iter().map(|(_, n)| *n).max().unwrap_or(1) as f64;

    let mut keywords: Vec<Keyword> = most_common(unigrams, num)
        .into_iter()
        .map(|(word, n)| Keyword::new(word, n as f64 / max_unigram, Method::Frequency))
        .chain(
            most_common(bigrams, num / 2)
                .into_iter()
                .map(|(bigram, n)| Keyword::new(bigram, n as f64 / max_bigram * 0.8, Method::Frequency)),
        )
        .collect();

    keywords.sort_by(|a, b| b.score.total_cmp(&a.score));
    keywords.truncate(num);
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_words_then_pairs() {
        let text = "Solar power is cheap. Solar power grows. Wind grows too, and solar wins.";
        let keywords = extract(text, 4);
        let names: Vec<&str> = keywords.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["solar", "solar power", "power", "grows"]);
        assert_eq!(keywords[0].score, 1.0);
        assert!((keywords[1].score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn skips_short_numeric_and_stop_words() {
        let keywords = extract("The q3 results of an ox are in 2024", 10);
        let names: Vec<&str> = keywords.iter().map(|k| k.keyword.as_str()).collect();
        assert_eq!(names, vec!["results"]);
    }

    #[test]
    fn counts_keep_first_appearance_order() {
        let words = ["beta", "alpha", "beta", "gamma", "alpha", "beta"].map(String::from);
        assert_eq!(
            count_in_order(words.into_iter()),
            vec![("beta".to_string(), 3), ("alpha".to_string(), 2), ("gamma".to_string(), 1)]
        );
    }
}
