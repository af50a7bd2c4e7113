use std::sync::Arc;

use async_trait::async_trait;
use text_splitter::TextSplitter;

use super::{TranslationError, TranslationProvider};

/// Splits long text into sentence-aligned pieces and translates them one by
/// one with the inner provider.
///
/// A piece the provider cannot translate is kept in the original language;
/// the call only fails when no piece was translated at all.
pub struct Chunked {
    inner: Arc<dyn TranslationProvider>,
    /// Texts at or below this length are passed through whole.
    threshold: usize,
    max_chars: usize,
}

impl Chunked {
    /// Chunk only texts longer than `threshold` characters.
    pub fn above(inner: Arc<dyn TranslationProvider>, threshold: usize, max_chars: usize) -> Self {
        Self {
            inner,
            threshold,
            max_chars,
        }
    }

    pub fn always(inner: Arc<dyn TranslationProvider>, max_chars: usize) -> Self {
        Self::above(inner, 0, max_chars)
    }
}

/// Pack sentences into pieces of at most `max_chars`, falling back to
/// word boundaries for sentences that do not fit.
pub fn chunk_sentences(text: &str, max_chars: usize) -> Vec<String> {
    TextSplitter::new(max_chars.max(1))
        .chunks(text)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl TranslationProvider for Chunked {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        if text.chars().count() <= self.threshold {
            return self.inner.translate(text, target).await;
        }

        let chunks = chunk_sentences(text, self.max_chars);
        let total = chunks.len();
        let mut translated = Vec::with_capacity(total);
        let mut succeeded = 0;

        for (i, chunk) in chunks.into_iter().enumerate() {
            match self.inner.translate(&chunk, target).await {
                Ok(t) if !t.trim().is_empty() => {
                    succeeded += 1;
                    translated.push(t);
                }
                Ok(_) => translated.push(chunk),
                Err(e) => {
                    tracing::debug!(provider = self.inner.name(), chunk = i + 1, total, error = %e, "chunk kept untranslated");
                    translated.push(chunk);
                }
            }
        }

        if succeeded == 0 {
            return Err(TranslationError::EmptyResult);
        }
        Ok(translated.join(" "))
    }
}
