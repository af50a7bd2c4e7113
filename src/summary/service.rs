use std::sync::Arc;
use std::time::Duration;

use super::abstractive::AbstractiveSummarizer;
use super::ranking::RankingMethod;
use super::{fallback, percentage};
use crate::outcome::Outcome;

/// The two summaries stored with every document.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPair {
    pub extractive: String,
    pub abstractive: String,
}

/// Character budget handed to the summarizers for an upload.
///
/// A tenth of the document, kept between 150 and 500, scaled by the
/// requested percentage and doubled, then bounded to 100..=800.
pub fn max_length_for(text_chars: usize, pct: u8) -> usize {
    let base = (text_chars / 10).clamp(150, 500) as f64;
    let scaled = (base * (pct.min(100) as f64 / 100.0) * 2.0) as usize;
    scaled.clamp(100, 800)
}

/// Token bounds for the AI model: at most `max_length`, around 30 % of the
/// word count, never below 30 unless the maximum is.
fn model_lengths(text: &str, max_length: usize) -> (usize, usize) {
    const MIN_LENGTH: usize = 30;
    let words = text.split_whitespace().count();
    let max = max_length.min(MIN_LENGTH.max(words * 3 / 10));
    (max, MIN_LENGTH.min(max / 2))
}

/// Summary orchestration with per-stage time budgets.
#[derive(Clone)]
pub struct SummaryService {
    ai: Option<Arc<dyn AbstractiveSummarizer>>,
    stage_timeout: Duration,
    abstractive_timeout: Duration,
}

impl SummaryService {
    pub fn new(
        ai: Option<Arc<dyn AbstractiveSummarizer>>,
        stage_timeout: Duration,
        abstractive_timeout: Duration,
    ) -> Self {
        Self {
            ai,
            stage_timeout,
            abstractive_timeout,
        }
    }

    /// Summaries for an uploaded document.
    ///
    /// The extractive summary is computed locally. The abstractive one comes
    /// from the AI summarizer when configured, falling back to the local
    /// sentence sampler. If the whole stage runs out of time, both summaries
    /// become a plain truncation of the text.
    pub async fn summarize_upload(&self, text: &str, pct: u8) -> Outcome<SummaryPair> {
        let max_length = max_length_for(text.chars().count(), pct);

        match tokio::time::timeout(self.stage_timeout, self.summarize_both(text, pct, max_length))
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                let truncated = fallback::truncate(text, max_length);
                Outcome::degraded(
                    SummaryPair {
                        extractive: truncated.clone(),
                        abstractive: truncated,
                    },
                    format!(
                        "summarization exceeded {}s, used truncation",
                        self.stage_timeout.as_secs()
                    ),
                )
            }
        }
    }

    async fn summarize_both(&self, text: &str, pct: u8, max_length: usize) -> Outcome<SummaryPair> {
        let owned = text.to_string();
        let extractive = match tokio::task::spawn_blocking(move || percentage::extractive(&owned, pct)).await
        {
            Ok(summary) => summary,
            Err(e) => {
                return Outcome::degraded(
                    SummaryPair {
                        extractive: fallback::truncate(text, max_length),
                        abstractive: fallback::truncate(text, max_length),
                    },
                    format!("extractive summarizer aborted: {e}"),
                )
            }
        };

        let abstractive = self.abstractive(text, pct, max_length).await;
        abstractive.map(|abstractive| SummaryPair {
            extractive,
            abstractive,
        })
    }

    /// AI summary under its own budget, else the local percentage sampler.
    pub async fn abstractive(&self, text: &str, pct: u8, max_length: usize) -> Outcome<String> {
        let Some(ai) = &self.ai else {
            return Outcome::Full(percentage::abstractive(text, pct));
        };

        let (max, min) = model_lengths(text, max_length);
        let reason = match tokio::time::timeout(self.abstractive_timeout, ai.summarize(text, max, min))
            .await
        {
            Ok(Ok(summary)) => return Outcome::Full(summary),
            Ok(Err(e)) => format!("AI summarizer failed: {e}"),
            Err(_) => format!(
                "AI summarizer exceeded {}s",
                self.abstractive_timeout.as_secs()
            ),
        };
        Outcome::degraded(percentage::abstractive(text, pct), reason)
    }

    /// Ranked-sentence summary bounded to about `max_length` characters,
    /// computed on the blocking pool.
    pub async fn summarize_text(&self, text: &str, max_length: usize, method: RankingMethod) -> Outcome<String> {
        let owned = text.to_string();
        match tokio::task::spawn_blocking(move || method.summarize(&owned, max_length)).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::degraded(
                fallback::truncate(text, max_length),
                format!("{} aborted: {e}", method.name()),
            ),
        }
    }

    /// Raw AI summary, used by the multilingual endpoint.
    pub(crate) async fn ai_summary(&self, text: &str, max_length: usize) -> Option<Result<String, String>> {
        let ai = self.ai.as_ref()?;
        let (max, min) = model_lengths(text, max_length);
        let result = match tokio::time::timeout(self.abstractive_timeout, ai.summarize(text, max, min)).await {
            Ok(Ok(summary)) => Ok(summary),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}s", self.abstractive_timeout.as_secs())),
        };
        Some(result)
    }
}
