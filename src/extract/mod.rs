//! Text extraction from uploaded documents.
//!
//! Each supported format has its own [`DocumentTextExtractor`]. Extractors are
//! synchronous (the parsing crates are blocking); [`Extractors::extract`] moves
//! the work onto the blocking pool and bounds it with a wall-clock timeout.

pub mod docx;
pub mod pdf;
pub mod pptx;
pub mod txt;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::outcome::Outcome;

/// Extensions accepted by the upload endpoint, in display order.
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".pdf", ".docx", ".txt", ".pptx"];

/// Extracted text shorter than this (after trimming) is treated as a failed
/// extraction for binary formats.
pub const MIN_EXTRACTED_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}. Allowed types: .pdf, .docx, .txt, .pptx")]
    UnsupportedFormat(String),

    #[error("Text extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error("Text extraction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Docx,
    Pptx,
    Txt,
}

impl FileKind {
    /// Classify a file by its (case-insensitive) extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let ext = filename
            .rfind('.')
            .map(|idx| filename[idx..].to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            ".pdf" => Ok(FileKind::Pdf),
            ".docx" => Ok(FileKind::Docx),
            ".pptx" => Ok(FileKind::Pptx),
            ".txt" => Ok(FileKind::Txt),
            _ => Err(ExtractionError::UnsupportedFormat(if ext.is_empty() {
                "(none)".to_string()
            } else {
                ext
            })),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Docx => ".docx",
            FileKind::Pptx => ".pptx",
            FileKind::Txt => ".txt",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
            FileKind::Pptx => "PPTX",
            FileKind::Txt => "TXT",
        }
    }
}

/// A single strategy for turning document bytes into text.
pub trait DocumentTextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract text. A `Degraded` outcome means a fallback strategy produced it.
    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError>;
}

/// Tries each extractor in order and returns the first one producing at
/// least `min_words` words.
pub struct Tiered {
    tiers: Vec<Box<dyn DocumentTextExtractor>>,
    min_words: usize,
}

impl Tiered {
    pub fn new(tiers: Vec<Box<dyn DocumentTextExtractor>>, min_words: usize) -> Self {
        Self { tiers, min_words }
    }
}

impl DocumentTextExtractor for Tiered {
    fn name(&self) -> &'static str {
        "tiered"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        let mut failures: Vec<String> = Vec::new();

        for (idx, tier) in self.tiers.iter().enumerate() {
            match tier.extract(bytes) {
                Ok(outcome) if outcome.value().split_whitespace().count() >= self.min_words => {
                    if idx == 0 {
                        return Ok(outcome);
                    }
                    let reason = format!("{} used after: {}", tier.name(), failures.join("; "));
                    return Ok(Outcome::degraded(outcome.into_value(), reason));
                }
                Ok(_) => {
                    tracing::debug!(extractor = tier.name(), "too little text, trying next tier");
                    failures.push(format!("{}: fewer than {} words", tier.name(), self.min_words));
                }
                Err(e) => {
                    tracing::debug!(extractor = tier.name(), error = %e, "extractor failed");
                    failures.push(format!("{}: {}", tier.name(), e));
                }
            }
        }

        Err(ExtractionError::Failed(failures.join("; ")))
    }
}

/// The extractor set used by the upload pipeline, one per [`FileKind`].
#[derive(Clone)]
pub struct Extractors {
    pdf: Arc<dyn DocumentTextExtractor>,
    docx: Arc<dyn DocumentTextExtractor>,
    pptx: Arc<dyn DocumentTextExtractor>,
    txt: Arc<dyn DocumentTextExtractor>,
    timeout: Duration,
}

impl Extractors {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pdf: Arc::new(pdf::PdfExtractor::new()),
            docx: Arc::new(docx::DocxExtractor),
            pptx: Arc::new(pptx::PptxExtractor),
            txt: Arc::new(txt::TxtExtractor),
            timeout,
        }
    }

    fn for_kind(&self, kind: FileKind) -> Arc<dyn DocumentTextExtractor> {
        match kind {
            FileKind::Pdf => self.pdf.clone(),
            FileKind::Docx => self.docx.clone(),
            FileKind::Pptx => self.pptx.clone(),
            FileKind::Txt => self.txt.clone(),
        }
    }

    /// Run the extractor for `kind` on the blocking pool, bounded by the timeout.
    ///
    /// On timeout the blocking task is abandoned, not cancelled.
    pub async fn extract(
        &self,
        kind: FileKind,
        bytes: Arc<Vec<u8>>,
    ) -> Result<Outcome<String>, ExtractionError> {
        let extractor = self.for_kind(kind);
        let task = tokio::task::spawn_blocking(move || extractor.extract(&bytes));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExtractionError::Failed(format!(
                "extractor task aborted: {join_err}"
            ))),
            Err(_) => Err(ExtractionError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Extraction as the upload pipeline wants it: binary formats never fail,
    /// they degrade to a placeholder paragraph describing the problem.
    ///
    /// Plain text has no placeholder; its errors propagate.
    pub async fn extract_or_placeholder(
        &self,
        kind: FileKind,
        filename: &str,
        bytes: Arc<Vec<u8>>,
    ) -> Result<Outcome<String>, ExtractionError> {
        let size = bytes.len();
        let result = self.extract(kind, bytes).await;

        if kind == FileKind::Txt {
            return result;
        }

        match result {
            Ok(outcome) if outcome.value().trim().chars().count() >= MIN_EXTRACTED_CHARS => {
                Ok(outcome)
            }
            Ok(_) => {
                tracing::warn!(filename, kind = kind.label(), "extracted text too short");
                Ok(Outcome::degraded(
                    placeholder(kind, filename, size),
                    "extracted text too short",
                ))
            }
            Err(e) => {
                tracing::warn!(filename, kind = kind.label(), error = %e, "extraction failed");
                Ok(Outcome::degraded(placeholder(kind, filename, size), e.to_string()))
            }
        }
    }
}

/// Human-readable paragraph standing in for text that could not be extracted.
pub fn placeholder(kind: FileKind, filename: &str, size: usize) -> String {
    let (what, reasons, suggestions): (&str, &[&str], &[&str]) = match kind {
        FileKind::Pdf => (
            "The PDF file could not be processed automatically.",
            &[
                "Password protection",
                "Scanned images without OCR text",
                "Corrupted file format",
                "Complex formatting",
                "Processing timeout",
            ],
            &[
                "Converting to a text-based PDF",
                "Using a different file format (DOCX, TXT)",
                "Ensuring the file is not password protected",
            ],
        ),
        FileKind::Docx => (
            "The Word document could not be processed automatically.",
            &[
                "Corrupted file format",
                "Complex formatting or embedded objects",
                "Password protection",
                "Unsupported DOCX version",
                "Processing timeout",
            ],
            &[
                "Saving as a simpler DOCX format",
                "Converting to TXT format",
                "Ensuring the file is not password protected",
            ],
        ),
        FileKind::Pptx | FileKind::Txt => (
            "The PowerPoint presentation could not be processed automatically.",
            &[
                "Complex slide layouts with embedded objects",
                "Password protection",
                "Corrupted file format",
                "Slides containing mostly images/graphics",
                "Processing timeout",
            ],
            &[
                "Saving as a simpler PPTX format",
                "Converting slide content to DOCX or TXT",
                "Ensuring the file is not password protected",
            ],
        ),
    };

    let mut out = format!(
        "{} Extraction Error for \"{}\":\n\n{} This could be due to:\n",
        kind.label(),
        filename,
        what
    );
    for reason in reasons {
        out.push_str("- ");
        out.push_str(reason);
        out.push('\n');
    }
    out.push_str("\nPlease try:\n");
    for (i, suggestion) in suggestions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, suggestion));
    }
    out.push_str(&format!("\nFilename: {filename}\nFile size: {size} bytes"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Result<&'static str, &'static str>);

    impl DocumentTextExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract(&self, _bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
            self.1
                .map(|t| Outcome::Full(t.to_string()))
                .map_err(|e| ExtractionError::Failed(e.to_string()))
        }
    }

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(FileKind::from_filename("Report.PDF").unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_filename("a.b.docx").unwrap(), FileKind::Docx);
        assert_eq!(FileKind::from_filename("slides.pptx").unwrap(), FileKind::Pptx);
        assert_eq!(FileKind::from_filename("notes.txt").unwrap(), FileKind::Txt);
    }

    #[test]
    fn rejects_unknown_extension_with_allowed_list() {
        let err = FileKind::from_filename("virus.exe").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(".exe"));
        assert!(msg.contains("Allowed types: .pdf, .docx, .txt, .pptx"));
        assert!(FileKind::from_filename("README").is_err());
    }

    #[test]
    fn tiered_prefers_first_tier() {
        let tiered = Tiered::new(
            vec![
                Box::new(Fixed("primary", Ok("one two three four five six"))),
                Box::new(Fixed("secondary", Ok("never used here at all"))),
            ],
            5,
        );
        let out = tiered.extract(b"").unwrap();
        assert!(!out.is_degraded());
        assert_eq!(out.value(), "one two three four five six");
    }

    #[test]
    fn tiered_falls_through_on_thin_text_and_marks_degraded() {
        let tiered = Tiered::new(
            vec![
                Box::new(Fixed("primary", Ok("two words"))),
                Box::new(Fixed("secondary", Ok("plenty of words in this one"))),
            ],
            5,
        );
        let out = tiered.extract(b"").unwrap();
        assert!(out.is_degraded());
        assert!(out.reason().unwrap().contains("primary"));
    }

    #[test]
    fn tiered_fails_when_every_tier_fails() {
        let tiered = Tiered::new(
            vec![
                Box::new(Fixed("primary", Err("broken"))),
                Box::new(Fixed("secondary", Ok("short"))),
            ],
            5,
        );
        assert!(matches!(tiered.extract(b""), Err(ExtractionError::Failed(_))));
    }

    #[test]
    fn placeholder_names_file_and_size() {
        let text = placeholder(FileKind::Docx, "memo.docx", 1234);
        assert!(text.starts_with("DOCX Extraction Error for \"memo.docx\""));
        assert!(text.contains("File size: 1234 bytes"));
        assert!(text.len() >= MIN_EXTRACTED_CHARS);
    }

    #[tokio::test]
    async fn broken_pdf_degrades_to_placeholder() {
        let extractors = Extractors::new(Duration::from_secs(5));
        let out = extractors
            .extract_or_placeholder(FileKind::Pdf, "broken.pdf", Arc::new(b"not a pdf".to_vec()))
            .await
            .unwrap();
        assert!(out.is_degraded());
        assert!(out.value().contains("PDF Extraction Error"));
    }

    #[tokio::test]
    async fn plain_text_is_never_replaced() {
        let extractors = Extractors::new(Duration::from_secs(5));
        let out = extractors
            .extract_or_placeholder(FileKind::Txt, "a.txt", Arc::new(b"hello world".to_vec()))
            .await
            .unwrap();
        assert_eq!(out, Outcome::Full("hello world".to_string()));
    }
}
