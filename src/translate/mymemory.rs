use async_trait::async_trait;
use serde::Deserialize;

use super::{TranslationError, TranslationProvider, SOURCE_LANGUAGE};

pub struct MyMemory {
    client: reqwest::Client,
    url: String,
}

impl MyMemory {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    /// Usually a number, occasionally a string; only `200` counts as success.
    response_status: serde_json::Value,
    #[serde(default)]
    response_data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    #[serde(default)]
    translated_text: String,
}

fn translated_text(response: MyMemoryResponse) -> Result<String, TranslationError> {
    let status = match &response.response_status {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    };
    if status != Some(200) {
        return Err(TranslationError::UnexpectedResponse(format!(
            "responseStatus {}",
            response.response_status
        )));
    }

    let text = response
        .response_data
        .map(|d| d.translated_text)
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(TranslationError::EmptyResult);
    }
    Ok(text)
}

#[async_trait]
impl TranslationProvider for MyMemory {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        let langpair = format!("{SOURCE_LANGUAGE}|{target}");
        let response: MyMemoryResponse = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        translated_text(response)
    }
}
