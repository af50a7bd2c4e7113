use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::summary::abstractive::SummaryQuality;
use crate::tts::ChunkMode;

/// Service configuration.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// runnable development setup. Secrets never come from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub auth: AuthConfig,
    pub pipeline: PipelineConfig,
    pub translation: TranslationConfig,
    pub tts: TtsConfig,
    pub summarizer: SummarizerConfig,
    pub keywords: KeywordConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request, above every per-stage budget.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Empty means any origin.
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "instabrief".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_token_expire_minutes: i64,
    pub dev_bypass_enabled: bool,
    pub dev_bypass_token: String,
    pub oauth_redirect_uri: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_expire_minutes: 60 * 24,
            dev_bypass_enabled: true,
            dev_bypass_token: "dev-token-bypass".to_string(),
            oauth_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction_timeout_secs: u64,
    pub summary_timeout_secs: u64,
    pub abstractive_timeout_secs: u64,
    /// Budget for translating both upload summaries together.
    pub translation_timeout_secs: u64,
    pub db_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl PipelineConfig {
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }

    pub fn abstractive_timeout(&self) -> Duration {
        Duration::from_secs(self.abstractive_timeout_secs)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout_secs)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_timeout_secs: 30,
            summary_timeout_secs: 45,
            abstractive_timeout_secs: 20,
            translation_timeout_secs: 20,
            db_timeout_secs: 10,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub timeout_secs: u64,
    pub google_url: String,
    pub mymemory_url: String,
    pub libretranslate_url: String,
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            google_url: "https://translate.googleapis.com/translate_a/single".to_string(),
            mymemory_url: "https://api.mymemory.translated.net/get".to_string(),
            libretranslate_url: "https://libretranslate.de/translate".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub chunk_mode: ChunkMode,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com/translate_tts".to_string(),
            chunk_mode: ChunkMode::Concatenate,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// When false, abstractive summaries are always computed locally.
    pub enabled: bool,
    pub base_url: String,
    pub quality: SummaryQuality,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api-inference.huggingface.co".to_string(),
            quality: SummaryQuality::Balanced,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Extraction methods in preference order.
    pub methods: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            methods: vec!["yake".to_string(), "tfidf".to_string(), "frequency".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "instabrief=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub mongodb_uri: String,
    pub secret_key: String,
    pub huggingface_token: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub microsoft_client_id: Option<String>,
    pub microsoft_client_secret: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            mongodb_uri: var("MONGODB_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            secret_key: var("SECRET_KEY").unwrap_or_else(|| {
                tracing::warn!("SECRET_KEY is not set, using an insecure development key");
                "change-me".to_string()
            }),
            huggingface_token: var("HUGGINGFACE_API_TOKEN"),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            google_client_secret: var("GOOGLE_CLIENT_SECRET"),
            microsoft_client_id: var("MICROSOFT_CLIENT_ID"),
            microsoft_client_secret: var("MICROSOFT_CLIENT_SECRET"),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with `INSTABRIEF__` (e.g. `INSTABRIEF__SERVER__PORT`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("INSTABRIEF")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.secrets = Secrets::from_env();
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.secrets = Secrets::from_env();
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [mongodb]
            database = "test"

            [pipeline]
            extraction_timeout_secs = 5

            [tts]
            chunk_mode = "first"

            [summarizer]
            enabled = false
            quality = "fast"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.mongodb.database, "test");
        assert_eq!(config.pipeline.extraction_timeout(), Duration::from_secs(5));
        assert_eq!(config.pipeline.summary_timeout_secs, 45);
        assert_eq!(config.tts.chunk_mode, ChunkMode::FirstOnly);
        assert!(!config.summarizer.enabled);
        assert_eq!(config.summarizer.quality, SummaryQuality::Fast);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.translation.timeout_secs, 15);
        assert_eq!(config.auth.access_token_expire_minutes, 1440);
        assert_eq!(config.tts.chunk_mode, ChunkMode::Concatenate);
        assert_eq!(config.keywords.methods, vec!["yake", "tfidf", "frequency"]);
        assert_eq!(config.pipeline.translation_timeout_secs, 20);
    }
}
