use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::documents::{attachment, binary_response};
use crate::app::AppState;
use crate::db::models::SummaryRecord;
use crate::error::AppError;
use crate::summary::ranking::RankingMethod;

const DEFAULT_MAX_LENGTH: usize = 150;

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub method: RankingMethod,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub id: String,
    pub text: String,
    pub summary: String,
}

impl From<SummaryRecord> for SummaryResponse {
    fn from(record: SummaryRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            text: record.text,
            summary: record.summary,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

async fn summarize(state: &AppState, request: &SummarizeRequest) -> Result<String, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required".into()));
    }
    let max_length = request.max_length.unwrap_or(DEFAULT_MAX_LENGTH).max(1);
    let outcome = state
        .summaries
        .summarize_text(&request.text, max_length, request.method)
        .await;
    if let Some(reason) = outcome.reason() {
        tracing::warn!(reason, method = request.method.name(), "summary degraded");
    }
    Ok(outcome.into_value())
}

/// `POST /api/summarize`: summarize and keep the text with its summary.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<Created>, AppError> {
    let summary = summarize(&state, &request).await?;
    let record = SummaryRecord {
        id: ObjectId::new(),
        text: request.text,
        summary,
    };
    state.records.insert_summary(&record).await?;

    Ok(Json(Created {
        id: record.id.to_hex(),
        summary: record.summary,
    }))
}

/// `POST /api/summarize/tts`: speak the summary without storing it.
pub async fn tts(State(state): State<AppState>, Json(request): Json<SummarizeRequest>) -> Result<Response, AppError> {
    let summary = summarize(&state, &request).await?;
    let audio = state.speech.synthesize(&summary, "en").await?;
    Ok(binary_response(audio, "audio/mpeg", attachment("summary.mp3")))
}

/// `GET /api/summarize`
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<SummaryResponse>>, AppError> {
    let records = state
        .records
        .list_summaries(page.skip, page.limit.clamp(1, 100))
        .await?;
    Ok(Json(records.into_iter().map(SummaryResponse::from).collect()))
}

/// `GET /api/summarize/{id}`
pub async fn get_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SummaryResponse>, AppError> {
    let record = state.records.find_summary(&id).await?.ok_or_else(not_found)?;
    Ok(Json(record.into()))
}

/// `GET /api/summarize/{id}/export`: the summary as a text file.
pub async fn export(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    let record = state.records.find_summary(&id).await?.ok_or_else(not_found)?;
    Ok(binary_response(
        record.summary.into_bytes(),
        "text/plain; charset=utf-8",
        attachment(&format!("summary-{id}.txt")),
    ))
}
