use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app::AppState;
use crate::auth::models::AuthUser;
use crate::auth::password::hash_in_background;
use crate::auth::token::TokenService;
use crate::db::models::User;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

pub const DEV_USER_EMAIL: &str = "john.doe@example.com";
const DEV_USER_PASSWORD: &str = "password123";

/// Find the development account, creating it on first use.
async fn dev_user(users: &dyn UserRepository) -> Result<AuthUser, AppError> {
    if let Some(user) = users.find_by_email(DEV_USER_EMAIL).await? {
        return Ok(AuthUser::from(&user));
    }

    let mut user = User::new(DEV_USER_EMAIL, "John", "Doe");
    user.password_hash = Some(hash_in_background(DEV_USER_PASSWORD).await?);
    users.insert(&user).await?;
    tracing::info!(email = DEV_USER_EMAIL, "created development user");
    Ok(AuthUser::from(&user))
}

/// Resolve the caller from an `Authorization` header value.
///
/// `dev_bypass` is the accepted development token, if bypass is enabled.
pub async fn authenticate(
    users: &dyn UserRepository,
    tokens: &TokenService,
    dev_bypass: Option<&str>,
    authorization: Option<&str>,
) -> Result<AuthUser, AppError> {
    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Not authenticated".into()))?;

    if dev_bypass == Some(token) {
        return dev_user(users).await;
    }

    let claims = tokens.verify(token)?;
    let user = users
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".into()))?;
    Ok(AuthUser::from(&user))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let bypass = state
            .auth
            .dev_bypass_enabled
            .then_some(state.auth.dev_bypass_token.as_str());

        authenticate(state.users.as_ref(), &state.tokens, bypass, authorization).await
    }
}

/// Routes open to anonymous callers still attribute work to a caller who
/// sends credentials; bad credentials are rejected rather than ignored.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::user_repository::MockUserRepository;

    fn tokens() -> TokenService {
        TokenService::new("middleware-secret", 60)
    }

    #[tokio::test]
    async fn missing_header_is_not_authenticated() {
        let users = MockUserRepository::new();
        let err = authenticate(&users, &tokens(), None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Not authenticated"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let users = MockUserRepository::new();
        let err = authenticate(&users, &tokens(), None, Some("Basic abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Not authenticated"));
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let user = User::new("jane@example.com", "Jane", "Roe");
        let id = user.id_hex();
        let token = tokens().issue(&id).unwrap();

        let mut users = MockUserRepository::new();
        let stored = user.clone();
        users
            .expect_find_by_id()
            .withf(move |candidate| candidate == id)
            .returning(move |_| Ok(Some(stored.clone())));

        let auth = authenticate(&users, &tokens(), None, Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(auth.email, "jane@example.com");
        assert_eq!(auth.id, user.id_hex());
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected() {
        let token = tokens().issue("507f1f77bcf86cd799439011").unwrap();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let err = authenticate(&users, &tokens(), None, Some(&format!("Bearer {token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "User not found"));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let users = MockUserRepository::new();
        let err = authenticate(&users, &tokens(), None, Some("Bearer not.a.jwt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Invalid token"));
    }

    #[tokio::test]
    async fn dev_bypass_creates_user_once() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == DEV_USER_EMAIL)
            .times(1)
            .returning(|_| Ok(None));
        users
            .expect_insert()
            .withf(|user| {
                user.first_name == "John"
                    && user.password_hash.as_deref().is_some_and(|h| h.starts_with("$argon2"))
            })
            .times(1)
            .returning(|_| Ok(()));

        let auth = authenticate(&users, &tokens(), Some("dev-token-bypass"), Some("Bearer dev-token-bypass"))
            .await
            .unwrap();
        assert_eq!(auth.email, DEV_USER_EMAIL);
        assert_eq!(auth.last_name, "Doe");
    }

    #[tokio::test]
    async fn dev_token_without_bypass_is_just_invalid() {
        let users = MockUserRepository::new();
        let err = authenticate(&users, &tokens(), None, Some("Bearer dev-token-bypass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == "Invalid token"));
    }
}
