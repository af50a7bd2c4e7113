use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::extract::ExtractionError;
use crate::translate::TranslationError;
use crate::tts::TtsError;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A downstream provider (or every provider in a chain) could not serve the request.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat(_) => AppError::BadRequest(err.to_string()),
            ExtractionError::Timeout(_) => AppError::Timeout(err.to_string()),
            ExtractionError::Failed(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<TranslationError> for AppError {
    fn from(err: TranslationError) -> Self {
        match err {
            TranslationError::EmptyText => AppError::BadRequest(err.to_string()),
            TranslationError::AllProvidersUnavailable => {
                AppError::Unavailable("All translation services unavailable".into())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<TtsError> for AppError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::EmptyText => AppError::BadRequest("Text cannot be empty".into()),
            other => AppError::Internal(format!("Text-to-speech failed: {other}")),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        AppError::BadRequest(format!("OAuth authentication failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_a_client_error() {
        let err: AppError = ExtractionError::UnsupportedFormat(".exe".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn exhausted_translation_chain_is_unavailable() {
        let err: AppError = TranslationError::AllProvidersUnavailable.into();
        match err {
            AppError::Unavailable(msg) => assert_eq!(msg, "All translation services unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_tts_text_is_rejected() {
        let err: AppError = TtsError::EmptyText.into();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Text cannot be empty"));
    }
}
