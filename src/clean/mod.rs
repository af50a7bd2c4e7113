//! Repair of text recovered from PDFs: ligatures, merged words, lost
//! paragraph breaks.
//!
//! [`clean`] is deterministic and converges: running it on its own output
//! changes nothing.

pub mod segment;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const LIGATURES: [(char, &str); 6] = [
    ('ﬁ', "fi"),
    ('ﬂ', "fl"),
    ('ﬀ', "ff"),
    ('ﬃ', "ffi"),
    ('ﬄ', "ffl"),
    ('ﬆ', "st"),
];

/// Words that PDF text layers commonly break apart, and their repaired form.
/// Every repaired form is in the embedded word list.
const BROKEN_FRAGMENTS: [(&str, &str); 22] = [
    ("ex ample", "example"),
    ("ex amples", "examples"),
    ("in clude", "include"),
    ("in cludes", "includes"),
    ("in cluded", "included"),
    ("in cluding", "including"),
    ("de scribe", "describe"),
    ("de scribes", "describes"),
    ("de scribed", "described"),
    ("moti v ation", "motivation"),
    ("oper ation", "operation"),
    ("oper ations", "operations"),
    ("func tion", "function"),
    ("func tions", "functions"),
    ("de finition", "definition"),
    ("ef ficient", "efficient"),
    ("dif ferent", "different"),
    ("s cal ability", "scalability"),
    ("parallel ize", "parallelize"),
    ("math em at ical", "mathematical"),
    ("pure math ematics", "pure mathematics"),
    ("serie s", "series"),
];

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CAMEL_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static LETTER_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z])(\d)").unwrap());
static DIGIT_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)([A-Za-z])").unwrap());
static PERIOD_CAPITAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Z])").unwrap());
static COMMA_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r",([A-Za-z])").unwrap());
// "...results. 3.1 Method" or "...done. 2. Setup" starts a new paragraph
static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.!?:]) (\d+(?:\.\d+)*\.?) ([A-Z])").unwrap());
static TOKEN_PARTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^A-Za-z]*)([A-Za-z]+)([^A-Za-z]*)$").unwrap());
static FRAGMENT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    BROKEN_FRAGMENTS
        .iter()
        .map(|(broken, fixed)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(broken));
            (Regex::new(&pattern).unwrap(), *fixed)
        })
        .collect()
});

static SUMMARY_SENTENCE_JOIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z][a-z])").unwrap());
static SUMMARY_PERIOD_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([A-Z][a-z])").unwrap());

/// Clean extracted text into blank-line separated paragraphs.
pub fn clean(text: &str) -> String {
    let text = replace_ligatures(text);
    let mut paragraphs: Vec<String> = Vec::new();

    for block in PARAGRAPH_BREAK.split(&text) {
        let paragraph = WHITESPACE.replace_all(block, " ");
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let paragraph = fix_spacing(paragraph);
        let paragraph = segment_words(&paragraph);
        let paragraph = repair_fragments(&paragraph);

        let split = NUMBERED_HEADING.replace_all(&paragraph, "$1\n\n$2 $3");
        paragraphs.extend(
            split
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
    }

    paragraphs.join("\n\n")
}

fn replace_ligatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == ch) {
            Some((_, plain)) => out.push_str(plain),
            None => out.push(ch),
        }
    }
    out
}

fn fix_spacing(paragraph: &str) -> String {
    let text = CAMEL_CASE.replace_all(paragraph, "$1 $2");
    let text = LETTER_DIGIT.replace_all(&text, "$1 $2");
    let text = DIGIT_LETTER.replace_all(&text, "$1 $2");
    let text = PERIOD_CAPITAL.replace_all(&text, ". $1");
    COMMA_LETTER.replace_all(&text, ", $1").into_owned()
}

/// Split merged words ("Atthe", "libraryand") token by token.
///
/// Only purely alphabetic tokens of three or more letters that are not
/// known words are considered, and all-caps tokens are left alone. A split
/// is kept only if every piece has two or more letters, or is "a"/"A"/"I".
fn segment_words(paragraph: &str) -> String {
    let dict = segment::dictionary();

    paragraph
        .split(' ')
        .map(|token| {
            let Some(parts) = TOKEN_PARTS.captures(token) else {
                return token.to_string();
            };
            let (lead, core, trail) = (&parts[1], &parts[2], &parts[3]);

            let all_caps = core.chars().all(|c| c.is_ascii_uppercase());
            if core.len() < 3 || all_caps || dict.contains(core) {
                return token.to_string();
            }

            let pieces = dict.split(core);
            let valid = pieces.len() > 1
                && pieces
                    .iter()
                    .all(|p| p.len() >= 2 || matches!(*p, "a" | "A" | "I"));
            if !valid {
                return token.to_string();
            }

            format!("{lead}{}{trail}", pieces.join(" "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn repair_fragments(paragraph: &str) -> String {
    let mut text = paragraph.to_string();
    for (pattern, fixed) in FRAGMENT_PATTERNS.iter() {
        text = pattern
            .replace_all(&text, |caps: &Captures| {
                let capitalized = caps[0].chars().next().is_some_and(|c| c.is_uppercase());
                if capitalized {
                    let mut chars = fixed.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect())
                        .unwrap_or_default()
                } else {
                    fixed.to_string()
                }
            })
            .into_owned();
    }
    text
}

/// Final touch-up for generated summaries: restore missing sentence breaks
/// between glued sentences and normalize spacing.
pub fn format_summary(summary: &str) -> String {
    let text = SUMMARY_SENTENCE_JOIN.replace_all(summary, "$1. $2");
    let text = SUMMARY_PERIOD_SPACE.replace_all(&text, ". $1");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_ligatures() {
        assert_eq!(clean("the ﬁrst eﬃcient ﬂow"), "the first efficient flow");
    }

    #[test]
    fn keeps_paragraphs_and_joins_lines() {
        let text = "First line\ncontinues here.\n\n\n  Second   paragraph.  ";
        assert_eq!(clean(text), "First line continues here.\n\nSecond paragraph.");
    }

    #[test]
    fn fixes_spacing() {
        assert_eq!(clean("endOf line"), "end Of line");
        assert_eq!(clean("page12 and 3rd"), "page 12 and 3 rd");
        assert_eq!(clean("done.Next,then"), "done. Next, then");
    }

    #[test]
    fn splits_merged_words() {
        assert_eq!(clean("Atthe end we need for the library"), "At the end we need for the library");
        assert_eq!(clean("the libraryand code"), "the library and code");
    }

    #[test]
    fn leaves_known_and_unknown_words_alone() {
        assert_eq!(clean("Kubernetes runs NASA workloads"), "Kubernetes runs NASA workloads");
        assert_eq!(clean("an example of information"), "an example of information");
    }

    #[test]
    fn repairs_broken_fragments() {
        assert_eq!(clean("For ex ample, the oper ation"), "For example, the operation");
        assert_eq!(clean("Ex ample text"), "Example text");
    }

    #[test]
    fn breaks_before_numbered_headings() {
        let text = "This ends the intro. 3.1 What we did was simple. 4. Results follow.";
        assert_eq!(
            clean(text),
            "This ends the intro.\n\n3.1 What we did was simple.\n\n4. Results follow."
        );
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "Atthe startof the reportTheteam found3 issues.Revenue grew,profit fell.",
            "ﬁnancial ex ample\nwith broken\n\nparagraphs. 2. Next Section follows. 2.1 Details here",
            "Kubernetes isgreat. Wehave 10x growth in Q3and the libraryand codeto ship",
            "",
            "   \n\n  ",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not a fixed point for {sample:?}");
        }
    }

    #[test]
    fn formats_summaries() {
        assert_eq!(
            format_summary("first sentence endsNext one.Third   part "),
            "first sentence ends. Next one. Third part"
        );
    }
}
