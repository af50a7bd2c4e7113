use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::error::AppError;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const MICROSOFT_USERINFO_URL: &str = "https://graph.microsoft.com/v1.0/me";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} client credentials are not configured")]
    NotConfigured(&'static str),

    #[error("Failed to get access token")]
    NoAccessToken,

    #[error("Email not provided by OAuth provider")]
    NoEmail,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Identity fields read from a provider's userinfo response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub oauth_id: Option<String>,
    pub picture: Option<String>,
}

fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

impl OAuthProfile {
    /// Google (`given_name`) and Microsoft Graph (`givenName`, `mail`) field
    /// spellings are both accepted.
    pub fn from_userinfo(value: &Value) -> Result<Self, OAuthError> {
        let email = first_str(value, &["email", "mail", "userPrincipalName"]).ok_or(OAuthError::NoEmail)?;
        Ok(Self {
            email,
            first_name: first_str(value, &["given_name", "givenName"]).unwrap_or_default(),
            last_name: first_str(value, &["family_name", "surname"]).unwrap_or_default(),
            oauth_id: first_str(value, &["id", "sub"]),
            picture: first_str(value, &["picture"]),
        })
    }
}

/// Authorization-code exchange against one identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

/// Standard OAuth 2.0 code flow: POST the code to the token endpoint, then
/// GET the userinfo endpoint with the returned bearer token.
pub struct HttpOAuthProvider {
    name: &'static str,
    client: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl HttpOAuthProvider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &'static str,
        client: reqwest::Client,
        token_url: &str,
        userinfo_url: &str,
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: &str,
    ) -> Self {
        Self {
            name,
            client,
            token_url: token_url.to_string(),
            userinfo_url: userinfo_url.to_string(),
            client_id,
            client_secret,
            redirect_uri: redirect_uri.to_string(),
        }
    }
}

#[async_trait]
impl OAuthProvider for HttpOAuthProvider {
    async fn exchange(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err(OAuthError::NotConfigured(self.name));
        };

        let token: Value = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let access_token = token
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(OAuthError::NoAccessToken)?;

        let userinfo: Value = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        OAuthProfile::from_userinfo(&userinfo)
    }
}

/// Providers by name.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl OAuthProviders {
    pub fn with(mut self, name: &str, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.insert(name.to_string(), provider);
        self
    }

    /// Google and Microsoft, with credentials from the environment.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build OAuth client: {e}")))?;
        let secrets = &config.secrets;
        let redirect = &config.auth.oauth_redirect_uri;

        Ok(Self::default()
            .with(
                "google",
                Arc::new(HttpOAuthProvider::new(
                    "google",
                    client.clone(),
                    GOOGLE_TOKEN_URL,
                    GOOGLE_USERINFO_URL,
                    secrets.google_client_id.clone(),
                    secrets.google_client_secret.clone(),
                    redirect,
                )),
            )
            .with(
                "microsoft",
                Arc::new(HttpOAuthProvider::new(
                    "microsoft",
                    client,
                    MICROSOFT_TOKEN_URL,
                    MICROSOFT_USERINFO_URL,
                    secrets.microsoft_client_id.clone(),
                    secrets.microsoft_client_secret.clone(),
                    redirect,
                )),
            ))
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn OAuthProvider>, AppError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::BadRequest("Unsupported provider".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_google_userinfo() {
        let profile = OAuthProfile::from_userinfo(&json!({
            "id": "1234",
            "email": "ana@gmail.com",
            "given_name": "Ana",
            "family_name": "Lima",
            "picture": "https://example.com/a.png"
        }))
        .unwrap();
        assert_eq!(profile.email, "ana@gmail.com");
        assert_eq!(profile.first_name, "Ana");
        assert_eq!(profile.last_name, "Lima");
        assert_eq!(profile.oauth_id.as_deref(), Some("1234"));
    }

    #[test]
    fn reads_graph_me() {
        let profile = OAuthProfile::from_userinfo(&json!({
            "id": "abc",
            "mail": null,
            "userPrincipalName": "bo@contoso.com",
            "givenName": "Bo",
            "surname": "Berg"
        }))
        .unwrap();
        assert_eq!(profile.email, "bo@contoso.com");
        assert_eq!(profile.first_name, "Bo");
        assert_eq!(profile.last_name, "Berg");
        assert_eq!(profile.picture, None);
    }

    #[test]
    fn missing_email_is_an_error() {
        let err = OAuthProfile::from_userinfo(&json!({"id": "1"})).unwrap_err();
        assert!(matches!(err, OAuthError::NoEmail));
    }

    #[test]
    fn unknown_provider_is_bad_request() {
        let providers = OAuthProviders::default().with("google", Arc::new(MockOAuthProvider::new()));
        assert!(providers.get("google").is_ok());
        let err = providers.get("github").err().unwrap();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Unsupported provider"));
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_before_any_request() {
        let provider = HttpOAuthProvider::new(
            "google",
            reqwest::Client::new(),
            "http://127.0.0.1:9/token",
            "http://127.0.0.1:9/me",
            None,
            None,
            "http://localhost:3000/auth/callback",
        );
        let err = provider.exchange("code").await.unwrap_err();
        assert!(matches!(err, OAuthError::NotConfigured("google")));
    }
}
