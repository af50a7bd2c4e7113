use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthUser;
use crate::db::models::{binary, Document, Summaries};
use crate::error::AppError;
use crate::extract::{FileKind, MIN_EXTRACTED_CHARS};
use crate::keywords::{self, entities, KeywordExtractor};
use crate::language::{self, SUPPORTED_LANGUAGES};
use crate::outcome::{Outcome, Processing, StageNotes};
use crate::summary::multilingual::SummaryKind;
use crate::summary::percentage;
use crate::summary::ranking::RankingMethod;
use crate::translate::SOURCE_LANGUAGE;
use crate::tts;

/// Characters of extracted text echoed back in the upload response.
const CONTENT_PREVIEW_CHARS: usize = 500;
const ANONYMOUS_OWNER: &str = "anonymous";

/// A parsed multipart upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub summary_type: String,
    /// Requested summary size, 0 to 100 percent.
    pub summary_length: u8,
    pub target_language: String,
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub title: String,
    pub original_filename: String,
    pub content: String,
    pub summary: Summaries,
    pub tags: Vec<String>,
    pub created_at: String,
    pub file_size: i64,
    pub file_type: String,
    pub processing: Processing,
    pub notes: Vec<String>,
}

/// Stored document metadata as returned by `GET /api/documents/{id}`.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub original_filename: String,
    pub content: String,
    pub summary: Summaries,
    pub tags: Vec<String>,
    pub created_at: String,
    pub file_size: i64,
    pub file_type: String,
    pub owner_id: String,
    pub processing: Processing,
    pub notes: Vec<String>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            original_filename: doc.original_filename,
            content: doc.content,
            summary: doc.summary,
            tags: doc.tags,
            created_at: doc.created_at.to_rfc3339(),
            file_size: doc.file_size,
            file_type: doc.file_type,
            owner_id: doc.owner_id,
            processing: doc.processing,
            notes: doc.notes,
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > CONTENT_PREVIEW_CHARS {
        let head: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Tags computed off the async runtime. A crashed task falls back to the
/// filename and vocabulary tags.
async fn upload_tags(keywords: Arc<KeywordExtractor>, text: &str, filename: &str) -> Outcome<Vec<String>> {
    let (owned_text, owned_name) = (text.to_string(), filename.to_string());
    match tokio::task::spawn_blocking(move || keywords.upload_tags(&owned_text, &owned_name)).await {
        Ok(tags) => Outcome::Full(tags),
        Err(e) => Outcome::degraded(
            keywords::generate_tags(text, filename),
            format!("keyword extraction aborted: {e}"),
        ),
    }
}

/// Summaries in the reader's language. English is the pipeline's language,
/// so only other targets cost a translation round-trip.
async fn translate_summaries(state: &AppState, summaries: Summaries, target: &str) -> Outcome<Summaries> {
    if target.is_empty() || target.eq_ignore_ascii_case(SOURCE_LANGUAGE) {
        return Outcome::Full(summaries);
    }

    let budget = state.pipeline.translation_timeout();
    let both = async {
        futures::join!(
            state.translator.translate(&summaries.extractive, target),
            state.translator.translate(&summaries.abstractive, target),
        )
    };
    match tokio::time::timeout(budget, both).await {
        Ok((Ok(extractive), Ok(abstractive))) => Outcome::Full(Summaries {
            extractive,
            abstractive,
        }),
        Ok((Err(e), _)) | Ok((_, Err(e))) => Outcome::degraded(
            summaries,
            format!("summaries left in English: {e}"),
        ),
        Err(_) => {
            tracing::warn!(target, budget_secs = budget.as_secs(), "summary translation timed out");
            Outcome::degraded(
                summaries,
                format!("summaries left in English: translation exceeded {}s", budget.as_secs()),
            )
        }
    }
}

/// Core upload pipeline, separated from the multipart handler for testability.
///
/// Extract, summarize, tag, then store. Every stage except the
/// extension check and the final save degrades instead of failing, and the
/// degradations are reported in `notes`.
pub async fn process_upload(state: &AppState, request: UploadRequest) -> Result<UploadResponse, AppError> {
    let max_bytes = state.pipeline.max_upload_bytes;
    if request.bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "File too large: {} bytes. Maximum size is {} bytes",
            request.bytes.len(),
            max_bytes
        )));
    }

    // Unsupported types are rejected before any extractor runs.
    let kind = FileKind::from_filename(&request.filename)?;
    let pct = request.summary_length.min(100);
    let file_size = request.bytes.len() as i64;

    tracing::info!(
        filename = %request.filename,
        size = file_size,
        summary_type = %request.summary_type,
        summary_length = pct,
        target_language = %request.target_language,
        "processing upload"
    );

    let bytes = Arc::new(request.bytes);
    let extracted = state
        .extractors
        .extract_or_placeholder(kind, &request.filename, bytes.clone())
        .await?;

    let mut notes = StageNotes::default();
    let text = notes.take("extraction", extracted);
    let short = text.trim().chars().count() < MIN_EXTRACTED_CHARS;

    let summaries = if short {
        tracing::info!(filename = %request.filename, chars = text.trim().chars().count(), "short document, skipping summarization");
        let brief = percentage::extractive(&text, pct);
        Summaries {
            extractive: brief.clone(),
            abstractive: brief,
        }
    } else {
        let pair = notes.take("summary", state.summaries.summarize_upload(&text, pct).await);
        Summaries {
            extractive: pair.extractive,
            abstractive: pair.abstractive,
        }
    };
    let summaries = notes.take(
        "translation",
        translate_summaries(state, summaries, &request.target_language).await,
    );
    let tags = notes.take(
        "keywords",
        upload_tags(state.keywords.clone(), &text, &request.filename).await,
    );

    let processing = if short {
        Processing::ShortDocument
    } else if notes.is_empty() {
        Processing::Full
    } else {
        Processing::Degraded
    };

    // An abandoned extractor task may still hold the bytes.
    let bytes = Arc::try_unwrap(bytes).unwrap_or_else(|shared| shared.as_ref().clone());

    let document = Document {
        object_id: ObjectId::new(),
        id: uuid::Uuid::new_v4().to_string(),
        title: request.filename.clone(),
        original_filename: request.filename.clone(),
        content: text,
        summary: summaries,
        tags,
        created_at: Utc::now(),
        file_size,
        file_type: kind.extension().to_string(),
        owner_id: request.owner_id,
        file_data: Some(binary(bytes)),
        processing,
        notes: notes.into_vec(),
    };

    let db_timeout = state.pipeline.db_timeout();
    let id = match tokio::time::timeout(db_timeout, state.storage.save_document(&document)).await {
        Ok(saved) => saved?,
        Err(_) => {
            tracing::error!(id = %document.id, "database save timed out");
            return Err(AppError::Timeout("Database operation timed out. Please try again.".into()));
        }
    };

    Ok(UploadResponse {
        id,
        title: document.title,
        original_filename: document.original_filename,
        content: preview(&document.content),
        summary: document.summary,
        tags: document.tags,
        created_at: document.created_at.to_rfc3339(),
        file_size,
        file_type: document.file_type,
        processing: document.processing,
        notes: document.notes,
    })
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {e}"))
}

/// `POST /api/documents/upload`
pub async fn upload(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut summary_type = "extractive".to_string();
    let mut summary_length: u8 = 10;
    let mut target_language = SOURCE_LANGUAGE.to_string();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, bytes.to_vec()));
            }
            "summary_type" => summary_type = field.text().await.map_err(multipart_error)?,
            "summary_length" => {
                let raw = field.text().await.map_err(multipart_error)?;
                let value: i64 = raw.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("summary_length must be an integer, got '{raw}'"))
                })?;
                summary_length = value.clamp(0, 100) as u8;
            }
            "target_language" => target_language = field.text().await.map_err(multipart_error)?,
            other => tracing::debug!(field = other, "ignoring unknown upload field"),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;
    if filename.is_empty() {
        return Err(AppError::BadRequest("Uploaded file has no name".into()));
    }

    let request = UploadRequest {
        filename,
        bytes,
        summary_type,
        summary_length,
        target_language,
        owner_id: user.map(|u| u.id).unwrap_or_else(|| ANONYMOUS_OWNER.to_string()),
    };

    Ok(Json(process_upload(&state, request).await?))
}

/// `GET /api/documents/health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Documents router is working"}))
}

/// `GET /api/documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let doc = state
        .storage
        .get_document_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;
    Ok(Json(doc.into()))
}

/// Attachment header value; quotes and control characters are dropped from the name.
pub(crate) fn attachment(filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

pub(crate) fn binary_response(bytes: Vec<u8>, content_type: &'static str, disposition: HeaderValue) -> Response {
    let mut response = Body::from(bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_DISPOSITION, disposition);
    response
}

/// `GET /api/documents/{id}/download`
pub async fn download(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    let doc = state
        .storage
        .get_document_with_file(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    let bytes = doc
        .file_bytes()
        .ok_or_else(|| AppError::NotFound("File data not found".into()))?
        .to_vec();

    Ok(binary_response(
        bytes,
        "application/octet-stream",
        attachment(&doc.original_filename),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    SOURCE_LANGUAGE.to_string()
}

/// `GET /api/documents/{id}/audio`: the extractive summary, spoken.
pub async fn audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, AppError> {
    let doc = state
        .storage
        .get_document_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;

    let audio = state
        .speech
        .synthesize(&doc.summary.extractive, &query.language)
        .await?;
    Ok(binary_response(audio, "audio/mpeg", attachment("summary_audio.mp3")))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// `POST /api/documents/translate`
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, AppError> {
    let translated_text = state
        .translator
        .translate(&request.text, &request.target_language)
        .await?;
    Ok(Json(TranslateResponse { translated_text }))
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// `POST /api/documents/text-to-speech`
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, AppError> {
    let audio = state.speech.synthesize(&request.text, &request.language).await?;
    let mut response = binary_response(audio, "audio/mpeg", attachment("speech.mp3"));
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}

/// `GET /api/documents/languages`
pub async fn languages() -> Json<Value> {
    let languages: Vec<Value> = SUPPORTED_LANGUAGES
        .iter()
        .map(|code| {
            let info = language::language_info(code);
            json!({
                "code": code,
                "name": info.name,
                "native": info.native,
                "family": info.family,
                "tts_quality": tts::is_supported(code).then(|| tts::quality(code)),
            })
        })
        .collect();

    Json(json!({
        "status": "success",
        "data": {"total_count": languages.len(), "languages": languages}
    }))
}

/// `GET /api/documents/voices`: languages the speech engine can read aloud.
pub async fn voices() -> Json<Value> {
    let voices = tts::supported_languages();
    Json(json!({
        "status": "success",
        "data": {"total_count": voices.len(), "voices": voices}
    }))
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub text: String,
}

/// `POST /api/documents/detect-language`
pub async fn detect_language(Json(request): Json<DetectRequest>) -> Json<Value> {
    if request.text.trim().chars().count() < 10 {
        return Json(json!({
            "status": "error",
            "message": "Text too short for reliable language detection",
            "data": {
                "primary_language": "en",
                "confidence": 0.3,
                "possible_languages": [["en", 0.3]],
                "is_supported": true
            }
        }));
    }

    let (primary, confidence) = language::detect(&request.text);
    Json(json!({
        "status": "success",
        "data": {
            "possible_languages": language::detect_multiple(&request.text, 3),
            "language_info": language::language_info(&primary),
            "is_supported": language::is_supported(&primary),
            "primary_language": primary,
            "confidence": confidence
        }
    }))
}

/// `POST /api/documents/entities`: people, organisations and dates found
/// by pattern.
pub async fn entities(Json(request): Json<DetectRequest>) -> Result<Json<Value>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text is required".into()));
    }
    let found = entities::extract(&request.text);
    Ok(Json(json!({
        "status": "success",
        "data": {"total_count": found.len(), "entities": found}
    })))
}

#[derive(Debug, Deserialize)]
pub struct MultilingualRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_language")]
    pub target_language: String,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub summary_type: SummaryKind,
    #[serde(default)]
    pub method: RankingMethod,
}

fn default_max_length() -> usize {
    150
}

/// `POST /api/documents/summarize-multilingual`
pub async fn summarize_multilingual(
    State(state): State<AppState>,
    Json(request): Json<MultilingualRequest>,
) -> Json<Value> {
    if request.text.trim().chars().count() < MIN_EXTRACTED_CHARS {
        return Json(json!({
            "status": "error",
            "message": "Text too short for meaningful summarization",
            "data": {}
        }));
    }

    let summary = state
        .multilingual
        .summarize(
            &request.text,
            &request.target_language,
            request.max_length,
            request.summary_type,
            request.method,
        )
        .await;
    Json(json!({"status": "success", "data": summary}))
}
