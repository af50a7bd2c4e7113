use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::users::validate_email;
use crate::app::AppState;
use crate::auth::oauth::OAuthProfile;
use crate::auth::password::{hash_in_background, verify_in_background};
use crate::auth::token::TokenService;
use crate::db::models::{AuthProvider, User};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuthTokenRequest {
    pub code: String,
    #[serde(default)]
    pub state: String,
    pub provider: String,
}

/// Create a local account.
pub async fn register_user(users: &dyn UserRepository, request: RegisterRequest) -> Result<Registered, AppError> {
    validate_email(&request.email)?;
    if request.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }
    if users.find_by_email(&request.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let mut user = User::new(request.email, request.first_name, request.last_name);
    user.password_hash = Some(hash_in_background(&request.password).await?);
    users.insert(&user).await?;

    tracing::info!(user = %user.id, "user registered");
    Ok(Registered {
        id: user.id_hex(),
        email: user.email,
    })
}

/// Check credentials and issue an access token. Unknown accounts, accounts
/// without a password and wrong passwords all fail the same way.
pub async fn login_user(
    users: &dyn UserRepository,
    tokens: &TokenService,
    request: LoginRequest,
) -> Result<TokenResponse, AppError> {
    let user = users.find_by_email(&request.email).await?;
    let valid = match user.as_ref().and_then(|u| u.password_hash.as_deref()) {
        Some(hash) => verify_in_background(&request.password, hash).await,
        None => false,
    };

    match user {
        Some(user) if valid => Ok(TokenResponse::bearer(tokens.issue(&user.id_hex())?)),
        _ => {
            tracing::debug!(email = %request.email, "login refused");
            Err(AppError::BadRequest("Invalid credentials".into()))
        }
    }
}

fn provider_kind(name: &str) -> AuthProvider {
    match name {
        "google" => AuthProvider::Google,
        "microsoft" => AuthProvider::Microsoft,
        _ => AuthProvider::Local,
    }
}

/// Existing accounts are matched by email; new ones are created from the
/// provider profile.
pub async fn sign_in_with_profile(
    users: &dyn UserRepository,
    tokens: &TokenService,
    provider: &str,
    profile: OAuthProfile,
) -> Result<TokenResponse, AppError> {
    let user_id = match users.find_by_email(&profile.email).await? {
        Some(existing) => existing.id_hex(),
        None => {
            let mut user = User::new(profile.email, profile.first_name, profile.last_name);
            user.auth_provider = provider_kind(provider);
            user.oauth_id = profile.oauth_id;
            user.picture = profile.picture;
            users.insert(&user).await?;
            tracing::info!(user = %user.id, provider, "user created from oauth profile");
            user.id_hex()
        }
    };
    Ok(TokenResponse::bearer(tokens.issue(&user_id)?))
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Registered>, AppError> {
    Ok(Json(register_user(state.users.as_ref(), request).await?))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(login_user(state.users.as_ref(), &state.tokens, request).await?))
}

/// `POST /api/auth/oauth/token`: trade an authorization code for our own
/// access token.
pub async fn oauth_token(
    State(state): State<AppState>,
    Json(request): Json<OAuthTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    tracing::debug!(provider = %request.provider, state = %request.state, "oauth code exchange");
    let provider = state.oauth.get(&request.provider)?;
    let profile = provider.exchange(&request.code).await?;
    let token = sign_in_with_profile(state.users.as_ref(), &state.tokens, &request.provider, profile).await?;
    Ok(Json(token))
}
