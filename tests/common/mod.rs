#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use instabrief::app::{build_router, AppState, Repositories, Services};
use instabrief::auth::oauth::OAuthProviders;
use instabrief::config::Config;
use instabrief::db::article_repository::MongoArticleRepository;
use instabrief::db::record_repository::MongoRecordRepository;
use instabrief::db::repository::MongoDocumentRepository;
use instabrief::db::user_repository::MongoUserRepository;
use instabrief::translate::Waterfall;
use instabrief::tts::{TtsEngine, TtsError};

pub const DEV_TOKEN: &str = "dev-token-bypass";

/// Stands in for the speech service: a tiny MP3 frame header per call.
pub struct SilentTts;

#[async_trait]
impl TtsEngine for SilentTts {
    async fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>, TtsError> {
        Ok(vec![0xFF, 0xFB, 0x90, 0x00])
    }
}

/// Holds the running MongoDB container and the router wired to it.
///
/// Outbound services are switched off: no AI summarizer, no translation
/// providers, silent speech. The container stops when this is dropped.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub state: AppState,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let db = mongo_client.database("instabrief_test");

        let documents = MongoDocumentRepository::new(&db);
        let articles = MongoArticleRepository::new(&db);
        let users = MongoUserRepository::new(&db);
        documents.ensure_indexes().await.expect("document indexes");
        articles.ensure_indexes().await.expect("article indexes");
        users.ensure_indexes().await.expect("user indexes");

        let mut config = Config::default();
        config.summarizer.enabled = false;
        config.secrets.secret_key = "integration-test-secret".to_string();
        config.secrets.mongodb_uri = mongo_uri;

        let repos = Repositories {
            documents: Arc::new(documents),
            articles: Arc::new(articles),
            users: Arc::new(users),
            records: Arc::new(MongoRecordRepository::new(&db)),
        };
        let services = Services {
            summarizer: None,
            translator: Arc::new(Waterfall::new(Vec::new())),
            tts: Arc::new(SilentTts),
            oauth: OAuthProviders::default(),
        };

        let state = AppState::new(&config, repos, services);
        let router = build_router(state.clone());

        Self {
            _mongo: mongo_container,
            router,
            state,
        }
    }

    /// `TestServer` that fails any request not answered with a 2xx.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// `TestServer` for error-path tests.
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Register an account and log it in, returning the bearer token.
    pub async fn sign_up(&self, server: &axum_test::TestServer, email: &str, password: &str) -> String {
        server
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "User"
            }))
            .await;

        let body: serde_json::Value = server
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .await
            .json();
        body["access_token"]
            .as_str()
            .expect("login should return a token")
            .to_string()
    }
}

/// `count` words cycling through a small business vocabulary.
pub fn business_text(count: usize) -> String {
    const VOCABULARY: [&str; 10] = [
        "revenue", "growth", "market", "customers", "quarterly",
        "strategy", "pricing", "channels", "retention", "forecast",
    ];
    (0..count)
        .map(|i| VOCABULARY[i % VOCABULARY.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
