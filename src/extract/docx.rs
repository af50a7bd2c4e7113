use super::{DocumentTextExtractor, ExtractionError};
use crate::outcome::Outcome;

/// Paragraph text from a Word document.
pub struct DocxExtractor;

impl DocumentTextExtractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx-lite"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        docx_lite::extract_text_from_bytes(bytes)
            .map(|text| Outcome::Full(text.trim().to_string()))
            .map_err(|e| ExtractionError::Failed(format!("Error reading DOCX: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_zip_input() {
        assert!(DocxExtractor.extract(b"plain bytes").is_err());
    }
}
