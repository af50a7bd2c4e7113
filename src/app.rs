use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{articles, auth, documents, feedback, logging, summaries, support, tags, users};
use crate::auth::oauth::OAuthProviders;
use crate::auth::token::TokenService;
use crate::config::{AuthConfig, Config, CorsConfig, PipelineConfig};
use crate::db::article_repository::ArticleRepository;
use crate::db::record_repository::RecordRepository;
use crate::db::repository::DocumentRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::extract::Extractors;
use crate::keywords::KeywordExtractor;
use crate::storage::gateway::StorageGateway;
use crate::summary::abstractive::{AbstractiveSummarizer, HuggingFaceSummarizer};
use crate::summary::multilingual::MultilingualSummarizer;
use crate::summary::SummaryService;
use crate::translate::Waterfall;
use crate::tts::google::GoogleTtsEngine;
use crate::tts::{SpeechService, TtsEngine};

/// Persistence handles, one per collection group.
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub users: Arc<dyn UserRepository>,
    pub records: Arc<dyn RecordRepository>,
}

/// Outbound collaborators: AI summarizer, translators, speech and identity providers.
pub struct Services {
    pub summarizer: Option<Arc<dyn AbstractiveSummarizer>>,
    pub translator: Arc<Waterfall>,
    pub tts: Arc<dyn TtsEngine>,
    pub oauth: OAuthProviders,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let summarizer: Option<Arc<dyn AbstractiveSummarizer>> = if config.summarizer.enabled {
            let hf = HuggingFaceSummarizer::new(
                config.summarizer.base_url.clone(),
                config.summarizer.quality,
                config.secrets.huggingface_token.clone(),
                Duration::from_secs(config.summarizer.timeout_secs),
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;
            Some(Arc::new(hf))
        } else {
            tracing::info!("AI summarizer disabled, abstractive summaries are computed locally");
            None
        };

        let translator = Waterfall::from_config(&config.translation)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let tts = GoogleTtsEngine::new(
            config.tts.base_url.clone(),
            Duration::from_secs(config.tts.timeout_secs),
        )?;

        Ok(Self {
            summarizer,
            translator: Arc::new(translator),
            tts: Arc::new(tts),
            oauth: OAuthProviders::from_config(config)?,
        })
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageGateway,
    pub users: Arc<dyn UserRepository>,
    pub records: Arc<dyn RecordRepository>,
    pub extractors: Extractors,
    pub summaries: SummaryService,
    pub multilingual: MultilingualSummarizer,
    pub translator: Arc<Waterfall>,
    pub speech: SpeechService,
    pub keywords: Arc<KeywordExtractor>,
    pub tokens: TokenService,
    pub oauth: OAuthProviders,
    pub auth: AuthConfig,
    pub pipeline: PipelineConfig,
    pub cors: CorsConfig,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, repos: Repositories, services: Services) -> Self {
        let pipeline = config.pipeline.clone();
        let summaries = SummaryService::new(
            services.summarizer,
            pipeline.summary_timeout(),
            pipeline.abstractive_timeout(),
        );

        Self {
            storage: StorageGateway::new(repos.documents, repos.articles, repos.users.clone()),
            users: repos.users,
            records: repos.records,
            extractors: Extractors::new(pipeline.extraction_timeout()),
            multilingual: MultilingualSummarizer::new(summaries.clone(), services.translator.clone()),
            summaries,
            translator: services.translator,
            speech: SpeechService::new(services.tts, config.tts.chunk_mode),
            keywords: Arc::new(KeywordExtractor::from_names(&config.keywords.methods)),
            tokens: TokenService::new(
                &config.secrets.secret_key,
                config.auth.access_token_expire_minutes,
            ),
            oauth: services.oauth,
            auth: config.auth.clone(),
            pipeline,
            cors: config.cors.clone(),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "InstaBrief API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(documents::health))
        .route("/upload", post(documents::upload))
        .route("/translate", post(documents::translate))
        .route("/text-to-speech", post(documents::text_to_speech))
        .route("/languages", get(documents::languages))
        .route("/voices", get(documents::voices))
        .route("/entities", post(documents::entities))
        .route("/detect-language", post(documents::detect_language))
        .route("/summarize-multilingual", post(documents::summarize_multilingual))
        .route("/{id}", get(documents::get_document))
        .route("/{id}/download", get(documents::download))
        .route("/{id}/audio", get(documents::audio))
}

fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(articles::list).post(articles::create))
        .route(
            "/{id}",
            get(articles::get_one).put(articles::update).delete(articles::remove),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me).put(users::update_me).delete(users::delete_me))
        .route("/me/articles", get(users::my_articles))
        .route("/me/preferences", get(users::preferences).put(users::update_preferences))
        .route("/me/api-keys", get(users::api_keys).post(users::create_api_key))
        .route("/me/api-keys/{key_id}", delete(users::delete_api_key))
        .route("/me/webhooks", get(users::webhooks).post(users::create_webhook))
        .route(
            "/me/webhooks/{webhook_id}",
            put(users::update_webhook).delete(users::delete_webhook),
        )
        .route("/me/change-password", post(users::change_password))
        .route("/me/2fa", get(users::two_factor).post(users::set_two_factor))
        .route(
            "/me/notifications",
            get(users::notifications).put(users::update_notifications),
        )
        .route("/me/integrations", get(users::integrations))
        .route("/me/integrations/{provider}/toggle", put(users::toggle_integration))
        .route("/me/integrations/{provider}/config", post(users::configure_integration))
}

fn summary_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(summaries::create).get(summaries::list))
        .route("/tts", post(summaries::tts))
        .route("/{id}", get(summaries::get_one))
        .route("/{id}/export", get(summaries::export))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/oauth/token", post(auth::oauth_token))
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/documents", document_routes())
        .nest("/articles", article_routes())
        .nest("/users", user_routes())
        .nest("/summarize", summary_routes())
        .nest("/auth", auth_routes())
        .route("/tags", get(tags::list))
        .route("/feedback", post(feedback::create))
        .route("/support", post(support::create));

    // Multipart framing adds a little on top of the file itself.
    let body_limit = state.pipeline.max_upload_bytes + 1024 * 1024;

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&state.cors))
                .layer(TimeoutLayer::new(state.request_timeout))
                .layer(middleware::from_fn(logging::log_request))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled || config.origins.is_empty() || config.origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<axum::http::HeaderValue> = config
        .origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
