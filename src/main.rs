use std::sync::Arc;

use anyhow::Context;
use instabrief::app::{build_router, AppState, Repositories, Services};
use instabrief::config::Config;
use instabrief::db::article_repository::MongoArticleRepository;
use instabrief::db::record_repository::MongoRecordRepository;
use instabrief::db::repository::MongoDocumentRepository;
use instabrief::db::user_repository::MongoUserRepository;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    tracing::info!("Starting InstaBrief server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.secrets.mongodb_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let db = mongo_client.database(&config.mongodb.database);

    let documents = MongoDocumentRepository::new(&db);
    let articles = MongoArticleRepository::new(&db);
    let users = MongoUserRepository::new(&db);
    documents.ensure_indexes().await?;
    articles.ensure_indexes().await?;
    users.ensure_indexes().await?;
    tracing::info!(database = %config.mongodb.database, "Connected to MongoDB");

    let repos = Repositories {
        documents: Arc::new(documents),
        articles: Arc::new(articles),
        users: Arc::new(users),
        records: Arc::new(MongoRecordRepository::new(&db)),
    };
    let services = Services::from_config(&config)?;
    let state = AppState::new(&config, repos, services);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
