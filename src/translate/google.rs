use async_trait::async_trait;
use serde_json::Value;

use super::{TranslationError, TranslationProvider, SOURCE_LANGUAGE};

/// The public `translate_a/single` endpoint used by the Google Translate web client.
pub struct GoogleTranslate {
    client: reqwest::Client,
    url: String,
}

impl GoogleTranslate {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

/// The response is `[[["translated", "source", ...], ...], ...]`; the
/// translation is the concatenation of the first element of every segment.
fn join_segments(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::UnexpectedResponse(body.to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(TranslationError::EmptyResult);
    }
    Ok(text)
}

#[async_trait]
impl TranslationProvider for GoogleTranslate {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let body: Value = self
            .client
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", SOURCE_LANGUAGE),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        join_segments(&body)
    }
}
