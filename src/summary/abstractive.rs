//! Abstractive summaries from the Hugging Face Inference API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Inputs longer than this are cut before being sent to the model.
const MAX_INPUT_CHARS: usize = 4096;
const MODEL_LOADING_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer request failed: {0}")]
    Request(String),

    #[error("summarizer returned status {0}")]
    Status(u16),

    #[error("unexpected summarizer response: {0}")]
    UnexpectedResponse(String),

    #[error("summarizer returned an empty summary")]
    Empty,
}

/// Model tier used for abstractive summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryQuality {
    Best,
    #[default]
    Balanced,
    Fast,
}

impl SummaryQuality {
    pub fn model(&self) -> &'static str {
        match self {
            SummaryQuality::Best => "facebook/bart-large-cnn",
            SummaryQuality::Balanced => "sshleifer/distilbart-cnn-12-6",
            SummaryQuality::Fast => "t5-small",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbstractiveSummarizer: Send + Sync {
    /// Lengths are in model tokens, as the inference API understands them.
    async fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, SummarizeError>;
}

pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: &'static str,
    token: Option<String>,
}

impl HuggingFaceSummarizer {
    pub fn new(
        base_url: impl Into<String>,
        quality: SummaryQuality,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: quality.model(),
            token,
        })
    }

    async fn post(&self, payload: &Value) -> Result<reqwest::Response, SummarizeError> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))
    }
}

/// Pull the summary out of either a `[{...}]` or a bare `{...}` response.
fn parse_summary(body: &Value) -> Result<String, SummarizeError> {
    let entry = match body {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(body),
        _ => None,
    };

    let text = entry
        .and_then(|e| e.get("summary_text").or_else(|| e.get("generated_text")))
        .and_then(Value::as_str)
        .ok_or_else(|| SummarizeError::UnexpectedResponse(body.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(SummarizeError::Empty);
    }
    Ok(text.to_string())
}

#[async_trait]
impl AbstractiveSummarizer for HuggingFaceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, SummarizeError> {
        let inputs: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let payload = json!({
            "inputs": inputs,
            "parameters": {
                "max_length": max_length,
                "min_length": min_length,
                "do_sample": false,
            },
            "options": { "wait_for_model": true },
        });

        let mut response = self.post(&payload).await?;
        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            tracing::info!(model = self.model, "model loading, retrying once");
            tokio::time::sleep(MODEL_LOADING_RETRY_DELAY).await;
            response = self.post(&payload).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::UnexpectedResponse(e.to_string()))?;
        parse_summary(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_by_quality() {
        assert_eq!(SummaryQuality::Best.model(), "facebook/bart-large-cnn");
        assert_eq!(SummaryQuality::default().model(), "sshleifer/distilbart-cnn-12-6");
        assert_eq!(SummaryQuality::Fast.model(), "t5-small");
    }

    #[test]
    fn parses_list_and_object_responses() {
        let list = json!([{ "summary_text": " Short summary. " }]);
        assert_eq!(parse_summary(&list).unwrap(), "Short summary.");

        let object = json!({ "generated_text": "Generated." });
        assert_eq!(parse_summary(&object).unwrap(), "Generated.");
    }

    #[test]
    fn rejects_unexpected_responses() {
        assert!(matches!(
            parse_summary(&json!({ "error": "Model is loading" })),
            Err(SummarizeError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            parse_summary(&json!([{ "summary_text": "  " }])),
            Err(SummarizeError::Empty)
        ));
    }
}
