//! Lightweight language identification.
//!
//! Non-Latin scripts are recognised by character ranges; Latin-script
//! languages by how many of their most common function words appear.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const SUPPORTED_LANGUAGES: [&str; 12] = [
    "en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ko", "ar", "hi",
];

const MIN_TEXT_CHARS: usize = 10;
const SCRIPT_DENSITY_THRESHOLD: f64 = 0.1;
const CONFIDENT: f64 = 0.7;

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").unwrap());
static NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[0-9\[\](){}.,;:!?"'\-]"#).unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const STOP_WORD_PROFILES: [(&str, &[&str]); 6] = [
    (
        "en",
        &[
            "the", "and", "is", "are", "of", "to", "in", "that", "it", "with", "for", "was",
            "this", "on", "be", "have", "not", "by", "from", "which",
        ],
    ),
    (
        "es",
        &[
            "el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "con",
            "para", "del", "se", "no", "lo", "como", "pero",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "de", "des", "et", "est", "un", "une", "du", "que", "dans", "pour",
            "pas", "qui", "sur", "au", "avec", "ce", "il",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "den", "mit", "von",
            "sich", "auf", "für", "dem", "im", "auch", "es", "wir",
        ],
    ),
    (
        "it",
        &[
            "il", "lo", "gli", "di", "che", "e", "è", "un", "una", "per", "non", "con", "del",
            "della", "sono", "nel", "alla", "come", "anche", "questo",
        ],
    ),
    (
        "pt",
        &[
            "o", "os", "as", "de", "que", "e", "é", "um", "uma", "para", "com", "não", "do", "da",
            "em", "no", "na", "por", "mais", "como",
        ],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub native: String,
    pub family: String,
}

/// Remove what carries no language signal: links, addresses, digits, punctuation.
fn clean(text: &str) -> String {
    let text = URL.replace_all(text, "");
    let text = EMAIL.replace_all(&text, "");
    let text = NOISE.replace_all(&text, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30ff}')
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{3400}'..='\u{4dbf}' | '\u{4e00}'..='\u{9fff}' | '\u{20000}'..='\u{2ceaf}')
}

fn script_of(c: char) -> Option<&'static str> {
    match c {
        '\u{0600}'..='\u{06ff}'
        | '\u{0750}'..='\u{077f}'
        | '\u{08a0}'..='\u{08ff}'
        | '\u{fb50}'..='\u{fdff}'
        | '\u{fe70}'..='\u{feff}' => Some("ar"),
        '\u{ac00}'..='\u{d7af}' | '\u{1100}'..='\u{11ff}' | '\u{3130}'..='\u{318f}' => Some("ko"),
        '\u{0900}'..='\u{097f}' => Some("hi"),
        '\u{0400}'..='\u{04ff}' => Some("ru"),
        c if is_kana(c) => Some("ja"),
        c if is_han(c) => Some("zh"),
        _ => None,
    }
}

/// Densest non-Latin script, with Han characters counted as Japanese when
/// any kana is present.
fn detect_script(text: &str) -> Option<(&'static str, f64)> {
    let total = text.chars().count();
    if total == 0 {
        return None;
    }
    let has_kana = text.chars().any(is_kana);

    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for c in text.chars() {
        let Some(mut lang) = script_of(c) else {
            continue;
        };
        if lang == "zh" && has_kana {
            lang = "ja";
        }
        match counts.iter_mut().find(|(l, _)| *l == lang) {
            Some((_, n)) => *n += 1,
            None => counts.push((lang, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(lang, n)| (lang, n as f64 / total as f64))
        .filter(|(_, density)| *density > SCRIPT_DENSITY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Per-language share of stop-word hits among all hits, best first.
fn stop_word_scores(text: &str) -> Vec<(&'static str, f64)> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let hits: Vec<(&'static str, usize)> = STOP_WORD_PROFILES
        .iter()
        .map(|(lang, profile)| {
            let n = words.iter().filter(|w| profile.contains(&w.as_str())).count();
            (*lang, n)
        })
        .filter(|(_, n)| *n > 0)
        .collect();

    let total: usize = hits.iter().map(|(_, n)| n).sum();
    let mut scores: Vec<(&'static str, f64)> = hits
        .into_iter()
        .map(|(lang, n)| (lang, n as f64 / total as f64))
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

fn script_confidence(density: f64) -> f64 {
    if density >= 0.5 {
        0.8
    } else {
        0.6
    }
}

/// Most likely language of `text` with a confidence in `0.0..=1.0`.
pub fn detect(text: &str) -> (String, f64) {
    detect_multiple(text, 1)
        .into_iter()
        .next()
        .unwrap_or_else(|| ("en".to_string(), 0.3))
}

/// Up to `top_n` candidate languages, most likely first. Never empty.
pub fn detect_multiple(text: &str, top_n: usize) -> Vec<(String, f64)> {
    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return vec![("en".to_string(), 0.5)];
    }
    let cleaned = clean(text);

    if let Some((lang, density)) = detect_script(&cleaned) {
        return vec![(lang.to_string(), script_confidence(density))];
    }

    let scores = stop_word_scores(&cleaned);
    if scores.is_empty() {
        return vec![("en".to_string(), 0.3)];
    }

    scores
        .into_iter()
        .take(top_n.max(1))
        .enumerate()
        .map(|(rank, (lang, share))| {
            let confidence = if rank == 0 && share >= CONFIDENT {
                share.min(0.99)
            } else {
                share
            };
            (lang.to_string(), confidence)
        })
        .collect()
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

pub fn language_info(code: &str) -> LanguageInfo {
    let (name, native, family) = match code {
        "en" => ("English", "English", "Germanic"),
        "es" => ("Spanish", "Español", "Romance"),
        "fr" => ("French", "Français", "Romance"),
        "de" => ("German", "Deutsch", "Germanic"),
        "it" => ("Italian", "Italiano", "Romance"),
        "pt" => ("Portuguese", "Português", "Romance"),
        "ru" => ("Russian", "Русский", "Slavic"),
        "zh" => ("Chinese", "中文", "Sino-Tibetan"),
        "ja" => ("Japanese", "日本語", "Japonic"),
        "ko" => ("Korean", "한국어", "Koreanic"),
        "ar" => ("Arabic", "العربية", "Semitic"),
        "hi" => ("Hindi", "हिन्दी", "Indo-Aryan"),
        other => {
            let upper = other.to_uppercase();
            return LanguageInfo {
                name: upper.clone(),
                native: upper,
                family: "Unknown".to_string(),
            };
        }
    };
    LanguageInfo {
        name: name.to_string(),
        native: native.to_string(),
        family: family.to_string(),
    }
}
