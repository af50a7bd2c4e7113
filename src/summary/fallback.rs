/// Fixed-ratio truncation used whenever a smarter summarizer fails or runs
/// out of time. Never fails.
pub fn truncate(text: &str, max_length: usize) -> String {
    let text = text.trim();
    let words: Vec<&str> = text.split_whitespace().collect();
    let target = (max_length / 4).min(words.len() / 5).min(100).max(20);

    if words.len() <= target {
        return text.to_string();
    }

    let cut = words[..target].join(" ");
    match cut.rfind('.') {
        Some(idx) if idx > cut.len() / 2 => cut[..=idx].to_string(),
        _ => format!("{cut}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_whole() {
        assert_eq!(truncate("  just a few words here ", 150), "just a few words here");
    }

    #[test]
    fn cuts_to_target_with_ellipsis() {
        let text = "word ".repeat(1000);
        let out = truncate(&text, 400);
        // min(400 / 4, 1000 / 5, 100) = 100 words
        assert_eq!(out.split_whitespace().count(), 100);
        assert!(out.ends_with("word..."));
    }

    #[test]
    fn prefers_sentence_boundary_in_second_half() {
        let text = format!("{} end. {}", "alpha ".repeat(30), "beta ".repeat(200));
        let out = truncate(&text, 200);
        // target is 46 words; the period after word 31 lies past the midpoint
        assert!(out.ends_with("end."));
    }

    #[test]
    fn never_below_twenty_words() {
        let text = "token ".repeat(60);
        let out = truncate(&text, 10);
        assert_eq!(out.split_whitespace().count(), 20);
    }
}
