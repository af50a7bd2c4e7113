//! Text-to-speech.
//!
//! [`SpeechService`] prepares the text (trim, cap, chunk) and falls back to
//! English once when the requested language fails. The audio itself comes
//! from a [`TtsEngine`].

pub mod google;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use text_splitter::TextSplitter;
use thiserror::Error;

pub use google::GoogleTtsEngine;

/// Longer input is cut to this many characters and suffixed with `...`.
pub const MAX_TEXT_CHARS: usize = 10_000;
/// Input longer than this is synthesized in sentence-aligned chunks.
pub const CHUNK_CHARS: usize = 5_000;
pub const FALLBACK_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("speech request failed: {0}")]
    Request(String),

    #[error("speech service returned status {0}")]
    Status(u16),

    #[error("speech service returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for TtsError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TtsError::Status(status.as_u16()),
            None => TtsError::Request(err.to_string()),
        }
    }
}

/// What to do with the chunks of a long text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ChunkMode {
    /// Synthesize every chunk and join the MP3 streams.
    #[default]
    #[serde(rename = "concatenate")]
    Concatenate,
    /// Synthesize only the first chunk.
    #[serde(rename = "first")]
    FirstOnly,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// MP3 audio for `text` in the (already normalized) `language`.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, TtsError>;
}

struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    native: &'static str,
    quality: u8,
}

const LANGUAGES: [LanguageEntry; 12] = [
    LanguageEntry { code: "en", name: "English", native: "English", quality: 5 },
    LanguageEntry { code: "es", name: "Spanish", native: "Español", quality: 5 },
    LanguageEntry { code: "fr", name: "French", native: "Français", quality: 5 },
    LanguageEntry { code: "de", name: "German", native: "Deutsch", quality: 5 },
    LanguageEntry { code: "it", name: "Italian", native: "Italiano", quality: 5 },
    LanguageEntry { code: "pt", name: "Portuguese", native: "Português", quality: 5 },
    LanguageEntry { code: "ru", name: "Russian", native: "Русский", quality: 4 },
    LanguageEntry { code: "zh", name: "Chinese", native: "中文", quality: 4 },
    LanguageEntry { code: "ja", name: "Japanese", native: "日本語", quality: 4 },
    LanguageEntry { code: "ko", name: "Korean", native: "한국어", quality: 4 },
    LanguageEntry { code: "ar", name: "Arabic", native: "العربية", quality: 4 },
    LanguageEntry { code: "hi", name: "Hindi", native: "हिन्दी", quality: 4 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsLanguage {
    pub code: &'static str,
    pub name: &'static str,
    pub native: &'static str,
    pub region: &'static str,
    pub quality: u8,
}

/// Map a language tag (`pt-BR`, `zh_TW`, `FR`) to a supported base code,
/// defaulting to English.
pub fn normalize_language(code: &str) -> &'static str {
    let base = code
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    LANGUAGES
        .iter()
        .find(|l| l.code == base)
        .map(|l| l.code)
        .unwrap_or(FALLBACK_LANGUAGE)
}

pub fn is_supported(code: &str) -> bool {
    let base = code.split(['-', '_']).next().unwrap_or_default().to_ascii_lowercase();
    LANGUAGES.iter().any(|l| l.code == base)
}

/// Quality rating (1 to 5) of the voice used for `code`.
pub fn quality(code: &str) -> u8 {
    let normalized = normalize_language(code);
    LANGUAGES
        .iter()
        .find(|l| l.code == normalized)
        .map(|l| l.quality)
        .unwrap_or(2)
}

/// Supported voices sorted by region, then name.
pub fn supported_languages() -> Vec<TtsLanguage> {
    let mut languages: Vec<TtsLanguage> = LANGUAGES
        .iter()
        .map(|l| TtsLanguage {
            code: l.code,
            name: l.name,
            native: l.native,
            region: "International",
            quality: l.quality,
        })
        .collect();
    languages.sort_by(|a, b| (a.region, a.name).cmp(&(b.region, b.name)));
    languages
}

/// Trim and cap the text; `None` when nothing is left to say.
fn prepare(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        let mut capped: String = text.chars().take(MAX_TEXT_CHARS).collect();
        capped.push_str("...");
        return Some(capped);
    }
    Some(text.to_string())
}

#[derive(Clone)]
pub struct SpeechService {
    engine: Arc<dyn TtsEngine>,
    chunk_mode: ChunkMode,
}

impl SpeechService {
    pub fn new(engine: Arc<dyn TtsEngine>, chunk_mode: ChunkMode) -> Self {
        Self { engine, chunk_mode }
    }

    /// MP3 audio for `text`. A failure in the requested language is retried
    /// once in English before giving up.
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, TtsError> {
        let text = prepare(text).ok_or(TtsError::EmptyText)?;
        let language = normalize_language(language);

        match self.render(&text, language).await {
            Ok(audio) => Ok(audio),
            Err(e) if language != FALLBACK_LANGUAGE => {
                tracing::warn!(language, error = %e, "speech failed, retrying in English");
                self.render(&text, FALLBACK_LANGUAGE).await
            }
            Err(e) => Err(e),
        }
    }

    async fn render(&self, text: &str, language: &str) -> Result<Vec<u8>, TtsError> {
        if text.chars().count() <= CHUNK_CHARS {
            return self.engine.synthesize(text, language).await;
        }

        let splitter = TextSplitter::new(CHUNK_CHARS);
        let chunks: Vec<&str> = splitter.chunks(text).collect();
        let wanted = match self.chunk_mode {
            ChunkMode::Concatenate => chunks.len(),
            ChunkMode::FirstOnly => 1,
        };
        tracing::debug!(chunks = chunks.len(), wanted, "synthesizing long text in chunks");

        let mut audio = Vec::new();
        for chunk in chunks.into_iter().take(wanted) {
            audio.extend(self.engine.synthesize(chunk, language).await?);
        }
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(audio)
    }
}
