//! Minimum-cost word segmentation over a frequency-ranked word list.
//!
//! A word at rank `r` (0-based) in a list of `n` words costs
//! `ln((r + 1) * ln n)`, which approximates Zipf's law: splitting a run of
//! letters into a few common words is cheaper than into many rare ones.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static DICTIONARY: Lazy<Dictionary> =
    Lazy::new(|| Dictionary::from_ranked(include_str!("words.txt")));

/// The embedded English word list.
pub fn dictionary() -> &'static Dictionary {
    &DICTIONARY
}

pub struct Dictionary {
    costs: HashMap<String, f64>,
    max_len: usize,
}

impl Dictionary {
    /// Build from one word per line, most frequent first. Later duplicates are ignored.
    pub fn from_ranked(list: &str) -> Self {
        let words: Vec<String> = list
            .lines()
            .map(|w| w.trim().to_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let log_n = (words.len().max(2) as f64).ln();

        let mut costs = HashMap::with_capacity(words.len());
        let mut max_len = 0;
        for (rank, word) in words.into_iter().enumerate() {
            max_len = max_len.max(word.len());
            costs
                .entry(word)
                .or_insert_with(|| ((rank + 1) as f64 * log_n).ln());
        }

        Self { costs, max_len }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.costs.contains_key(&word.to_ascii_lowercase())
    }

    /// Split an ASCII-alphabetic token into the cheapest sequence of known
    /// words, returning slices of the original (case is preserved).
    ///
    /// Returns the token unchanged when no full segmentation exists.
    pub fn split<'a>(&self, token: &'a str) -> Vec<&'a str> {
        if token.is_empty() || !token.is_ascii() {
            return vec![token];
        }

        let lower = token.to_ascii_lowercase();
        let n = lower.len();
        let mut best = vec![f64::INFINITY; n + 1];
        let mut start = vec![0usize; n + 1];
        best[0] = 0.0;

        for end in 1..=n {
            for len in 1..=end.min(self.max_len) {
                let from = end - len;
                if best[from].is_infinite() {
                    continue;
                }
                if let Some(cost) = self.costs.get(&lower[from..end]) {
                    let total = best[from] + cost;
                    if total < best[end] {
                        best[end] = total;
                        start[end] = from;
                    }
                }
            }
        }

        if best[n].is_infinite() {
            return vec![token];
        }

        let mut pieces = Vec::new();
        let mut end = n;
        while end > 0 {
            let from = start[end];
            pieces.push(&token[from..end]);
            end = from;
        }
        pieces.reverse();
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dictionary {
        Dictionary::from_ranked("the\nof\nand\nto\na\nin\nworld\nhello\nat\nable\nnot\nnotable\n")
    }

    #[test]
    fn splits_into_known_words() {
        assert_eq!(tiny().split("helloworld"), vec!["hello", "world"]);
        assert_eq!(tiny().split("attheworld"), vec!["at", "the", "world"]);
    }

    #[test]
    fn preserves_case() {
        assert_eq!(tiny().split("HelloWorld"), vec!["Hello", "World"]);
    }

    #[test]
    fn prefers_frequent_single_word_over_pieces() {
        // "notable" is one (rarer) word, but still cheaper than "not" + "able"
        let dict = tiny();
        let whole = dict.costs["notable"];
        let split = dict.costs["not"] + dict.costs["able"];
        assert!(whole < split);
        assert_eq!(dict.split("notable"), vec!["notable"]);
    }

    #[test]
    fn leaves_unsegmentable_tokens_alone() {
        assert_eq!(tiny().split("xyzzy"), vec!["xyzzy"]);
    }

    #[test]
    fn embedded_list_is_loaded() {
        let dict = dictionary();
        assert!(dict.contains("example"));
        assert!(dict.contains("The"));
        assert!(!dict.contains("qwertyuiop"));
    }
}
