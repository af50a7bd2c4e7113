//! Length-driven summaries that sample the beginning, middle and end of a
//! document. Percentages map linearly onto a word (or sentence) budget.

use crate::clean::format_summary;

const MIN_WORDS: f64 = 50.0;
const MAX_WORDS: f64 = 750.0;
const MIN_SENTENCES: f64 = 2.0;
const MAX_SENTENCES: f64 = 30.0;
/// A summary never takes more than this share of the source.
const MAX_SOURCE_SHARE: f64 = 0.8;

pub const EMPTY_SUMMARY: &str = "No content available for summarization.";

fn clamp_pct(pct: u8) -> f64 {
    f64::from(pct.min(100)) / 100.0
}

/// Word budget for an extractive summary of a `total_words`-word source.
pub fn target_words(pct: u8, total_words: usize) -> usize {
    let target = (MIN_WORDS + clamp_pct(pct) * (MAX_WORDS - MIN_WORDS)) as usize;
    target.min((total_words as f64 * MAX_SOURCE_SHARE) as usize)
}

/// Sentence budget for an abstractive-style summary.
pub fn target_sentences(pct: u8, total_sentences: usize) -> usize {
    let target = (MIN_SENTENCES + clamp_pct(pct) * (MAX_SENTENCES - MIN_SENTENCES)) as usize;
    target.min((total_sentences as f64 * MAX_SOURCE_SHARE) as usize)
}

/// Summary for documents too short to sample, or `None` if sampling applies.
fn trivial_summary(text: &str) -> Option<String> {
    if text.is_empty() {
        return Some(EMPTY_SUMMARY.to_string());
    }
    if text.split_whitespace().count() < 10 {
        let head: String = text.chars().take(200).collect();
        let ellipsis = if text.chars().count() > 200 { "..." } else { "" };
        return Some(format!("This is a brief document containing: {head}{ellipsis}"));
    }
    None
}

/// Split a budget 40/30/30 between beginning, middle and end.
fn split_budget(target: usize) -> (usize, usize, usize) {
    let begin = (target as f64 * 0.4) as usize;
    let middle = (target as f64 * 0.3) as usize;
    (begin, middle, target - begin - middle)
}

fn ensure_terminal_punctuation(mut summary: String) -> String {
    if !summary.is_empty() && !summary.ends_with(['.', '!', '?']) {
        summary.push('.');
    }
    summary
}

/// Extractive summary built from verbatim word runs.
pub fn extractive(text: &str, pct: u8) -> String {
    let text = text.trim();
    if let Some(summary) = trivial_summary(text) {
        return summary;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let total = words.len();
    let target = target_words(pct, total);

    let mut summary = if target >= total {
        words[..(total as f64 * 0.95) as usize].join(" ")
    } else {
        let (begin, middle, end) = split_budget(target);
        let middle_start = total / 3;
        let middle_end = (middle_start + middle).min(total);
        let end_start = total.saturating_sub(end).max(middle_end + 10).min(total);

        let mut selected: Vec<&str> = Vec::with_capacity(target);
        selected.extend_from_slice(&words[..begin]);
        selected.extend_from_slice(&words[middle_start..middle_end]);
        selected.extend_from_slice(&words[end_start..]);
        selected.truncate(target);
        selected.join(" ")
    };

    if pct <= 20 && summary.len() > 500 {
        summary = summary.split_whitespace().take(50).collect::<Vec<_>>().join(" ");
    }

    format_summary(&ensure_terminal_punctuation(summary))
}

/// Sentence-sampling summary used when no abstractive model is available.
pub fn abstractive(text: &str, pct: u8) -> String {
    let text = text.trim();
    if let Some(summary) = trivial_summary(text) {
        return summary;
    }

    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let total = sentences.len();
    let target = target_sentences(pct, total);

    let selected: Vec<&str> = if target >= total {
        sentences[..(total as f64 * 0.95) as usize].to_vec()
    } else {
        let (begin, middle, end) = split_budget(target);
        let middle_start = total / 3;
        let middle_end = (middle_start + middle).min(total);
        let end_start = total.saturating_sub(end).max(middle_end + 2).min(total);
        let end_stop = (end_start + end).min(total);

        let mut selected = Vec::with_capacity(target);
        selected.extend_from_slice(&sentences[..begin]);
        selected.extend_from_slice(&sentences[middle_start..middle_end]);
        selected.extend_from_slice(&sentences[end_start..end_stop]);
        selected.truncate(target);
        selected
    };

    format_summary(&ensure_terminal_punctuation(selected.join(". ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn target_is_monotonic_and_capped() {
        for total in [20, 100, 500, 1000, 5000] {
            let mut previous = 0;
            for pct in 10..=100 {
                let t = target_words(pct, total);
                assert!(t >= previous, "not monotonic at {pct}% of {total}");
                assert!(t as f64 <= total as f64 * 0.8);
                previous = t;
            }
        }
    }

    #[test]
    fn linear_budget() {
        assert_eq!(target_words(0, 10_000), 50);
        assert_eq!(target_words(40, 10_000), 330);
        assert_eq!(target_words(100, 10_000), 750);
        assert_eq!(target_words(50, 500), 400);
        assert_eq!(target_sentences(50, 100), 16);
    }

    #[test]
    fn empty_and_brief_inputs() {
        assert_eq!(extractive("   ", 50), EMPTY_SUMMARY);
        assert_eq!(
            abstractive("hello world", 50),
            "This is a brief document containing: hello world"
        );
    }

    #[test]
    fn extractive_respects_budget() {
        let text = words(500);
        let summary = extractive(&text, 50);
        let count = summary.split_whitespace().count();
        assert!((300..=400).contains(&count), "got {count} words");
        assert!(summary.starts_with("w0 w1"));
        assert!(summary.ends_with("w499."));
    }

    #[test]
    fn short_percentages_are_trimmed_hard() {
        let text = "alphabetical ".repeat(2000);
        let summary = extractive(&text, 10);
        assert!(summary.split_whitespace().count() <= 50);
    }

    #[test]
    fn abstractive_samples_sentences() {
        let text: String = (0..40).map(|i| format!("Sentence number {i}. ")).collect();
        let summary = abstractive(&text, 30);
        let count = summary.split(". ").count();
        assert_eq!(count, target_sentences(30, 40));
        assert!(summary.starts_with("Sentence number 0. Sentence number 1"));
        assert!(summary.ends_with('.'));
    }
}
