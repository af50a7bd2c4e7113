use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocumentTextExtractor, ExtractionError, Tiered};
use crate::clean;
use crate::outcome::Outcome;

/// Below this many words a PDF is assumed to have no usable text layer.
const MIN_PDF_WORDS: usize = 5;

static HYPHEN_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)-\s*$").unwrap());
static WORD_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)").unwrap());
// word- + line break + lowercase continuation; keeps compounds like "user-facing"
static INLINE_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-[ \t]*\r?\n[ \t]*([a-z]\w*)").unwrap());

/// Drop the last non-empty line of a page if it is just a page number.
fn remove_trailing_page_number(page_text: &str) -> String {
    let lines: Vec<&str> = page_text.lines().collect();
    let Some(last_idx) = lines.iter().rposition(|l| !l.trim().is_empty()) else {
        return page_text.to_string();
    };

    let last_line = lines[last_idx].trim();
    if last_line.chars().all(|c| c.is_ascii_digit()) {
        let mut kept = lines[..last_idx].to_vec();
        kept.extend_from_slice(&lines[last_idx + 1..]);
        kept.join("\n")
    } else {
        page_text.to_string()
    }
}

/// Join page texts, rejoining words hyphenated across a page or line break.
///
/// Pages are separated by a blank line so the cleaner sees them as paragraphs.
fn join_pages(pages: Vec<String>) -> String {
    let mut result = String::new();

    for (i, page) in pages.iter().map(|p| remove_trailing_page_number(p)).enumerate() {
        if i == 0 {
            result = page;
            continue;
        }

        let trimmed_len = result.trim_end().len();
        let hyphen = HYPHEN_END
            .captures(&result[..trimmed_len])
            .and_then(|c| c.get(0).map(|m| m.start()));
        let page_trimmed = page.trim_start();
        let continuation = WORD_START.captures(page_trimmed).and_then(|c| c.get(1));

        match (hyphen, continuation) {
            (Some(hyphen_start), Some(next_word)) => {
                let first_part = result[hyphen_start..trimmed_len]
                    .trim_end()
                    .trim_end_matches('-')
                    .to_string();
                result.truncate(hyphen_start);
                result.push_str(&first_part);
                result.push_str(next_word.as_str());
                result.push_str(&page_trimmed[next_word.end()..]);
            }
            _ => {
                result.push_str("\n\n");
                result.push_str(&page);
            }
        }
    }

    INLINE_HYPHEN.replace_all(&result, "$1$2").trim().to_string()
}

/// Page-aware extraction through `pdf-extract`.
pub struct PdfExtractText;

impl DocumentTextExtractor for PdfExtractText {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractionError::Failed(format!("PDF extraction failed: {e:?}")))?;
        Ok(Outcome::Full(join_pages(pages)))
    }
}

/// Simpler content-stream text extraction through `lopdf`.
pub struct LopdfText;

impl DocumentTextExtractor for LopdfText {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractionError::Failed(format!("Error reading PDF: {e}")))?;

        let mut pages = Vec::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::warn!(page = page_num, error = %e, "failed to extract page, skipping")
                }
            }
        }

        Ok(Outcome::Full(join_pages(pages)))
    }
}

fn page_count(bytes: &[u8]) -> Option<usize> {
    lopdf::Document::load_mem(bytes)
        .ok()
        .map(|doc| doc.get_pages().len())
}

/// Notice used when a PDF opens fine but carries no text layer.
pub fn image_only_notice(pages: usize) -> String {
    format!(
        "This PDF document appears to contain primarily images, charts, or formatted content \
         that cannot be automatically extracted as text. The document has {pages} pages and may \
         contain visual elements, diagrams, or special formatting that requires manual review to \
         fully understand the content."
    )
}

/// PDF extraction: `pdf-extract`, then `lopdf`, then an image-only notice.
///
/// Text recovered by either tier goes through the cleaner.
pub struct PdfExtractor {
    tiers: Tiered,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            tiers: Tiered::new(vec![Box::new(PdfExtractText), Box::new(LopdfText)], MIN_PDF_WORDS),
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        match self.tiers.extract(bytes) {
            Ok(outcome) => Ok(outcome.map(|text| clean::clean(&text))),
            Err(e) => match page_count(bytes) {
                Some(pages) if pages > 0 => Ok(Outcome::degraded(
                    image_only_notice(pages),
                    format!("no text layer: {e}"),
                )),
                _ => Err(e),
            },
        }
    }
}
