use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ranking::RankingMethod;
use super::service::SummaryService;
use crate::language::{self, LanguageInfo};
use crate::translate::Waterfall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    #[default]
    Extractive,
    Abstractive,
    Both,
}

impl SummaryKind {
    fn wants_extractive(self) -> bool {
        matches!(self, SummaryKind::Extractive | SummaryKind::Both)
    }

    fn wants_abstractive(self) -> bool {
        matches!(self, SummaryKind::Abstractive | SummaryKind::Both)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MultilingualSummary {
    pub detected_language: String,
    pub target_language: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_info: Option<LanguageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractive_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstractive_summary: Option<String>,
    /// Untranslated AI summary, present when it was translated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_abstractive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_extractive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

/// Summaries in the language the reader asked for.
#[derive(Clone)]
pub struct MultilingualSummarizer {
    summaries: SummaryService,
    translator: Arc<Waterfall>,
}

impl MultilingualSummarizer {
    pub fn new(summaries: SummaryService, translator: Arc<Waterfall>) -> Self {
        Self {
            summaries,
            translator,
        }
    }

    /// Translation happens only when the target differs from the detected
    /// language and is not English.
    fn needs_translation(detected: &str, target: &str) -> bool {
        target != detected && target != crate::translate::SOURCE_LANGUAGE
    }

    pub async fn summarize(
        &self,
        text: &str,
        target_language: &str,
        max_length: usize,
        kind: SummaryKind,
        method: RankingMethod,
    ) -> MultilingualSummary {
        if text.trim().is_empty() {
            return MultilingualSummary {
                detected_language: "en".to_string(),
                target_language: target_language.to_string(),
                confidence: 0.0,
                extractive_summary: Some(String::new()),
                abstractive_summary: Some(String::new()),
                ..Default::default()
            };
        }

        let (detected, confidence) = language::detect(text);
        let translate = Self::needs_translation(&detected, target_language);
        let mut result = MultilingualSummary {
            language_info: Some(language::language_info(&detected)),
            detected_language: detected,
            target_language: target_language.to_string(),
            confidence,
            ..Default::default()
        };

        if kind.wants_extractive() {
            let summary = self.summaries.summarize_text(text, max_length, method).await;
            result.extractive_summary = Some(summary.into_value());
        }

        if kind.wants_abstractive() {
            match self.summaries.ai_summary(text, max_length).await {
                Some(Ok(summary)) if translate => {
                    let translated = self.translator.translate(&summary, target_language).await;
                    result.abstractive_summary = Some(match translated {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::warn!(error = %e, "abstractive summary left untranslated");
                            summary.clone()
                        }
                    });
                    result.original_abstractive = Some(summary);
                }
                Some(Ok(summary)) => result.abstractive_summary = Some(summary),
                Some(Err(e)) => {
                    result.abstractive_summary = Some(self.extractive_fallback(&result, text, max_length, method).await);
                    result.error = Some(format!("AI summarization failed: {e}"));
                }
                None => {
                    result.abstractive_summary = Some(self.extractive_fallback(&result, text, max_length, method).await);
                    result.error = Some("Multilingual AI not available".to_string());
                }
            }
        }

        if translate {
            if let Some(extractive) = &result.extractive_summary {
                match self.translator.translate(extractive, target_language).await {
                    Ok(t) => result.translated_extractive = Some(t),
                    Err(e) => {
                        result.translated_extractive = Some(extractive.clone());
                        result.translation_error = Some(format!("Translation failed: {e}"));
                    }
                }
            }
        }

        result
    }

    /// The extractive summary, computed now if the caller did not ask for one.
    async fn extractive_fallback(
        &self,
        result: &MultilingualSummary,
        text: &str,
        max_length: usize,
        method: RankingMethod,
    ) -> String {
        match &result.extractive_summary {
            Some(summary) => summary.clone(),
            None => self.summaries.summarize_text(text, max_length, method).await.into_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::abstractive::{AbstractiveSummarizer, MockAbstractiveSummarizer, SummarizeError};
    use crate::translate::{MockTranslationProvider, TranslationProvider};
    use std::time::Duration;

    const TEXT: &str = "The city council approved a new budget for public parks. \
        The budget adds funding for playgrounds and trees. \
        Residents asked for more lighting in the evening. \
        The council will review the plan again next spring.";

    fn translator(reply: Option<&'static str>, calls: usize) -> Arc<Waterfall> {
        let mut provider = MockTranslationProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_translate()
            .times(calls)
            .returning(move |_, _| reply.map(str::to_string).ok_or(crate::translate::TranslationError::Status(500)));
        Arc::new(Waterfall::new(vec![Arc::new(provider) as Arc<dyn TranslationProvider>]))
    }

    fn summarizer(ai: Option<MockAbstractiveSummarizer>, translator: Arc<Waterfall>) -> MultilingualSummarizer {
        let service = SummaryService::new(
            ai.map(|m| Arc::new(m) as Arc<dyn AbstractiveSummarizer>),
            Duration::from_secs(45),
            Duration::from_secs(20),
        );
        MultilingualSummarizer::new(service, translator)
    }

    #[tokio::test]
    async fn english_target_needs_no_translation() {
        let out = summarizer(None, translator(None, 0))
            .summarize(TEXT, "en", 150, SummaryKind::Extractive, RankingMethod::TextRank)
            .await;
        assert_eq!(out.detected_language, "en");
        assert!(out.extractive_summary.is_some());
        assert!(out.translated_extractive.is_none());
        assert!(out.abstractive_summary.is_none());
    }

    #[tokio::test]
    async fn translates_both_summaries_for_foreign_target() {
        let mut ai = MockAbstractiveSummarizer::new();
        ai.expect_summarize()
            .times(1)
            .returning(|_, _, _| Ok("Council approves park budget.".to_string()));

        let out = summarizer(Some(ai), translator(Some("traducido"), 2))
            .summarize(TEXT, "es", 150, SummaryKind::Both, RankingMethod::TextRank)
            .await;
        assert_eq!(out.abstractive_summary.as_deref(), Some("traducido"));
        assert_eq!(out.original_abstractive.as_deref(), Some("Council approves park budget."));
        assert_eq!(out.translated_extractive.as_deref(), Some("traducido"));
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn ai_failure_falls_back_to_extractive() {
        let mut ai = MockAbstractiveSummarizer::new();
        ai.expect_summarize()
            .times(1)
            .returning(|_, _, _| Err(SummarizeError::Status(503)));

        let out = summarizer(Some(ai), translator(None, 0))
            .summarize(TEXT, "en", 150, SummaryKind::Both, RankingMethod::TextRank)
            .await;
        assert_eq!(out.abstractive_summary, out.extractive_summary);
        assert!(out.error.unwrap().starts_with("AI summarization failed"));
    }

    #[tokio::test]
    async fn missing_ai_is_reported() {
        let out = summarizer(None, translator(None, 0))
            .summarize(TEXT, "en", 150, SummaryKind::Abstractive, RankingMethod::TextRank)
            .await;
        assert!(out.abstractive_summary.is_some());
        assert!(out.extractive_summary.is_none());
        assert_eq!(out.error.as_deref(), Some("Multilingual AI not available"));
    }

    #[tokio::test]
    async fn translation_failure_keeps_original() {
        let out = summarizer(None, translator(None, 1))
            .summarize(TEXT, "fr", 150, SummaryKind::Extractive, RankingMethod::TextRank)
            .await;
        assert_eq!(out.translated_extractive, out.extractive_summary);
        assert!(out.translation_error.is_some());
    }

    #[tokio::test]
    async fn empty_text_yields_empty_summaries() {
        let out = summarizer(None, translator(None, 0))
            .summarize("   ", "de", 150, SummaryKind::Both, RankingMethod::TextRank)
            .await;
        assert_eq!(out.confidence, 0.0);
        assert_eq!(out.extractive_summary.as_deref(), Some(""));
    }
}
