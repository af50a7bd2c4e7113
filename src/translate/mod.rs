//! Translation through a chain of public providers.
//!
//! [`Waterfall`] asks each provider in turn and returns the first non-empty
//! translation. Providers are never retried and later providers are not
//! contacted once one succeeds.

pub mod chunked;
pub mod google;
pub mod libre;
pub mod mymemory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TranslationConfig;
use chunked::Chunked;
use google::GoogleTranslate;
use libre::LibreTranslate;
use mymemory::MyMemory;

/// All providers translate from English.
pub const SOURCE_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("translation request failed: {0}")]
    Request(String),

    #[error("translation provider returned status {0}")]
    Status(u16),

    #[error("unexpected translation response: {0}")]
    UnexpectedResponse(String),

    #[error("translation provider returned no text")]
    EmptyResult,

    #[error("All translation services unavailable")]
    AllProvidersUnavailable,
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TranslationError::Status(status.as_u16()),
            None => TranslationError::Request(err.to_string()),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate English `text` into `target`. An empty translation is an error.
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError>;
}

pub struct Waterfall {
    providers: Vec<Arc<dyn TranslationProvider>>,
}

impl Waterfall {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    /// Google, MyMemory, LibreTranslate (chunked above 2000 chars), then
    /// MyMemory again in 400-char pieces.
    pub fn from_config(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        let mymemory = Arc::new(MyMemory::new(client.clone(), &config.mymemory_url));
        let providers: Vec<Arc<dyn TranslationProvider>> = vec![
            Arc::new(GoogleTranslate::new(client.clone(), &config.google_url)),
            mymemory.clone(),
            Arc::new(Chunked::above(
                Arc::new(LibreTranslate::new(client, &config.libretranslate_url)),
                2000,
                1500,
            )),
            Arc::new(Chunked::always(mymemory, 400)),
        ];
        Ok(Self::new(providers))
    }

    pub async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyText);
        }
        if target.eq_ignore_ascii_case(SOURCE_LANGUAGE) {
            return Ok(text.to_string());
        }

        for provider in &self.providers {
            match provider.translate(text, target).await {
                Ok(translated) if !translated.trim().is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        target,
                        chars = translated.chars().count(),
                        "translation succeeded"
                    );
                    return Ok(translated);
                }
                Ok(_) => {
                    tracing::warn!(provider = provider.name(), target, "provider returned empty text");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), target, error = %e, "provider failed");
                }
            }
        }

        Err(TranslationError::AllProvidersUnavailable)
    }
}
