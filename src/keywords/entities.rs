use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PERSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap());
static ORGANIZATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[A-Z][a-zA-Z\s]+(?:Corp|Inc|Ltd|LLC|Company|Organization|Institute|University|College)\b",
    )
    .unwrap()
});
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b|\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Org,
    Date,
}

/// A pattern match; `start`/`end` are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

/// Pattern-based entities, grouped by label (people, organisations, dates).
pub fn extract(text: &str) -> Vec<Entity> {
    [
        (&*PERSON, EntityLabel::Person),
        (&*ORGANIZATION, EntityLabel::Org),
        (&*DATE, EntityLabel::Date),
    ]
    .into_iter()
    .flat_map(|(pattern, label)| {
        pattern.find_iter(text).map(move |m| Entity {
            text: m.as_str().to_string(),
            label,
            start: m.start(),
            end: m.end(),
        })
    })
    .collect()
}
