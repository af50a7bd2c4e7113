//! Keyword, tag and entity extraction.

pub mod entities;
pub mod frequency;
pub mod stopwords;
pub mod tfidf;
pub mod yake;

use serde::Serialize;

/// Keywords requested per upload; the first five become tags.
pub const UPLOAD_KEYWORDS: usize = 8;
const KEYWORD_TAGS: usize = 5;
const MAX_TAGS: usize = 8;
const MAX_DOCUMENT_TAGS: usize = 5;
const MIN_TEXT_CHARS: usize = 10;

const BUSINESS_KEYWORDS: [&str; 8] = [
    "business",
    "report",
    "analysis",
    "strategy",
    "performance",
    "financial",
    "quarterly",
    "annual",
];

pub const DEFAULT_TAGS: [&str; 2] = ["Document", "Analysis"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Yake,
    Tfidf,
    Frequency,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "yake" => Some(Method::Yake),
            "tfidf" => Some(Method::Tfidf),
            "frequency" => Some(Method::Frequency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub keyword: String,
    pub score: f64,
    pub method: Method,
}

impl Keyword {
    pub fn new(keyword: impl Into<String>, score: f64, method: Method) -> Self {
        Self {
            keyword: keyword.into(),
            score,
            method,
        }
    }
}

/// Runs keyword methods in preference order until one produces results.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    methods: Vec<Method>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(vec![Method::Yake, Method::Tfidf, Method::Frequency])
    }
}

impl KeywordExtractor {
    /// Frequency analysis is always appended as the last resort.
    pub fn new(mut methods: Vec<Method>) -> Self {
        if methods.last() != Some(&Method::Frequency) {
            methods.retain(|m| *m != Method::Frequency);
            methods.push(Method::Frequency);
        }
        Self { methods }
    }

    /// Build from configured method names; unknown names are skipped.
    pub fn from_names(names: &[String]) -> Self {
        let methods = names
            .iter()
            .filter_map(|name| {
                let method = Method::from_name(name);
                if method.is_none() {
                    tracing::warn!(method = %name, "unknown keyword method, skipping");
                }
                method
            })
            .collect();
        Self::new(methods)
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn extract(&self, text: &str, num: usize) -> Vec<Keyword> {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Vec::new();
        }

        for method in &self.methods {
            let keywords = match method {
                Method::Yake => yake::extract(text, num),
                Method::Tfidf => tfidf::extract(text, num).unwrap_or_else(|| frequency::extract(text, num)),
                Method::Frequency => frequency::extract(text, num),
            };
            if !keywords.is_empty() {
                return keywords;
            }
            tracing::debug!(?method, "keyword method found nothing, trying next");
        }
        Vec::new()
    }

    /// Tags stored with an uploaded document. Never empty.
    pub fn upload_tags(&self, text: &str, filename: &str) -> Vec<String> {
        let keyword_tags = self
            .extract(text, UPLOAD_KEYWORDS)
            .into_iter()
            .take(KEYWORD_TAGS)
            .map(|k| title_case(&k.keyword));

        let mut tags: Vec<String> = Vec::new();
        for tag in keyword_tags.chain(document_tags(text, filename)) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags.truncate(MAX_TAGS);

        if tags.is_empty() {
            default_tags()
        } else {
            tags
        }
    }
}

pub fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Tags from the filename parts and the business vocabulary found in the text.
pub fn document_tags(text: &str, filename: &str) -> Vec<String> {
    let lower_name = filename.to_lowercase();
    let name_tags = lower_name
        .split(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| part.chars().count() > 2)
        .map(title_case);

    let lower_text = text.to_lowercase();
    let business_tags = BUSINESS_KEYWORDS
        .iter()
        .filter(|k| lower_text.contains(*k))
        .map(|k| title_case(k));

    let mut tags: Vec<String> = Vec::new();
    for tag in name_tags.chain(business_tags) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.truncate(MAX_DOCUMENT_TAGS);
    tags
}

/// Like [`document_tags`], falling back to [`DEFAULT_TAGS`].
pub fn generate_tags(text: &str, filename: &str) -> Vec<String> {
    let tags = document_tags(text, filename);
    if tags.is_empty() {
        default_tags()
    } else {
        tags
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "The quarterly report covers solar energy. Solar capacity doubled this year. \
        Investors expect solar growth to continue. Storage costs also fell sharply.";

    #[test]
    fn short_text_has_no_keywords() {
        assert!(KeywordExtractor::default().extract("tiny", 5).is_empty());
    }

    #[test]
    fn falls_back_to_frequency_for_single_sentence() {
        let keywords = KeywordExtractor::new(vec![Method::Tfidf]).extract("Rust makes systems programming safe and rust is fast", 3);
        assert_eq!(keywords[0].keyword, "rust");
        assert_eq!(keywords[0].method, Method::Frequency);
    }

    #[test]
    fn frequency_is_always_last() {
        let extractor = KeywordExtractor::from_names(&["frequency".into(), "keybert".into(), "tfidf".into()]);
        assert_eq!(extractor.methods(), &[Method::Tfidf, Method::Frequency]);
    }

    #[test]
    fn yake_leads_the_default_chain() {
        let extractor = KeywordExtractor::default();
        assert_eq!(extractor.methods(), &[Method::Yake, Method::Tfidf, Method::Frequency]);
        let keywords = extractor.extract(REPORT, 5);
        assert_eq!(keywords[0].method, Method::Yake);
        assert_eq!(keywords[0].keyword, "quarterly report");
    }

    #[test]
    fn title_cases_like_headlines() {
        assert_eq!(title_case("solar power"), "Solar Power");
        assert_eq!(title_case("q3 REPORT"), "Q3 Report");
    }

    #[test]
    fn document_tags_from_filename_and_vocabulary() {
        assert_eq!(
            document_tags("A financial overview", "annual_report-2024.pdf"),
            vec!["Annual", "Report", "2024", "Pdf", "Financial"]
        );
        assert_eq!(generate_tags("nothing here", "a.tx"), default_tags());
    }

    #[test]
    fn upload_tags_merge_keywords_and_document_tags() {
        let tags = KeywordExtractor::new(vec![Method::Tfidf]).upload_tags(REPORT, "q3_report.txt");
        assert!(!tags.is_empty());
        assert!(tags.len() <= MAX_TAGS);
        assert_eq!(tags[0], "Solar");
        assert!(tags.contains(&"Report".to_string()));
        let mut unique = tags.clone();
        unique.dedup();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn upload_tags_never_empty() {
        assert_eq!(KeywordExtractor::default().upload_tags("", "x.md"), default_tags());
    }
}
