use std::time::Duration;

use async_trait::async_trait;
use text_splitter::TextSplitter;

use super::{TtsEngine, TtsError};

/// The public endpoint rejects longer requests.
const SEGMENT_CHARS: usize = 200;

/// Google Translate's `translate_tts` voice endpoint.
pub struct GoogleTtsEngine {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTtsEngine {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; instabrief)")
            .build()
            .map_err(|e| TtsError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

pub(crate) fn segments(text: &str) -> Vec<&str> {
    TextSplitter::new(SEGMENT_CHARS).chunks(text).collect()
}

#[async_trait]
impl TtsEngine for GoogleTtsEngine {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, TtsError> {
        let parts = segments(text);
        let total = parts.len().to_string();
        let mut audio = Vec::new();

        for (idx, part) in parts.into_iter().enumerate() {
            let idx = idx.to_string();
            let textlen = part.chars().count().to_string();
            let bytes = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language),
                    ("q", part),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(audio)
    }
}
