use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{TranslationError, TranslationProvider, SOURCE_LANGUAGE};

/// A LibreTranslate instance (`POST /translate`).
pub struct LibreTranslate {
    client: reqwest::Client,
    url: String,
}

impl LibreTranslate {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    #[serde(default)]
    translated_text: String,
}

#[async_trait]
impl TranslationProvider for LibreTranslate {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let request = LibreRequest {
            q: text,
            source: SOURCE_LANGUAGE,
            target,
            format: "text",
        };

        let response: LibreResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.translated_text.trim().is_empty() {
            return Err(TranslationError::EmptyResult);
        }
        Ok(response.translated_text)
    }
}
