use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::articles::{responses, ArticleResponse};
use crate::app::AppState;
use crate::auth::models::AuthUser;
use crate::auth::password::{hash_in_background, verify_in_background};
use crate::db::models::{
    ApiKey, Integration, Notifications, Preferences, ProfileUpdate, StoredNotifications,
    StoredPreferences, User, Webhook, WebhookUpdate,
};
use crate::error::AppError;

const API_KEY_PREFIX: &str = "ib_";

async fn load_user(state: &AppState, caller: &AuthUser) -> Result<User, AppError> {
    state
        .users
        .find_by_id(&caller.id)
        .await?
        .ok_or_else(|| AppError::Auth("User not found".into()))
}

fn updated(flag: bool) -> Json<Value> {
    Json(json!({ "updated": flag }))
}

fn deleted(flag: bool) -> Json<Value> {
    Json(json!({ "deleted": flag }))
}

/// `ib_` followed by 32 url-safe characters (24 random bytes).
pub fn generate_api_key() -> String {
    let bytes: [u8; 24] = rand::random();
    format!("{API_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email address".into()))
    }
}

/// Integration names become part of a stored field path.
fn validate_provider(provider: &str) -> Result<(), AppError> {
    let valid = !provider.is_empty()
        && provider
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid integration provider".into()))
    }
}

/// `GET /api/users/me`
pub async fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}

/// `PUT /api/users/me`
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    if update.is_empty() {
        return Ok(updated(false));
    }

    if let Some(email) = update.email.as_deref() {
        validate_email(email)?;
        if let Some(existing) = state.users.find_by_email(email).await? {
            if existing.id_hex() != user.id {
                return Err(AppError::BadRequest("Email already in use".into()));
            }
        }
    }

    let changed = state.users.update_profile(&user.id, &update).await?;
    Ok(updated(changed))
}

/// `DELETE /api/users/me`: the account, its articles and its feedback.
pub async fn delete_me(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, AppError> {
    let articles = state.storage.delete_articles_by_owner(&user.id).await?;
    let feedback = state.records.delete_feedback_by_user(&user.id).await?;
    let removed = state.users.delete(&user.id).await?;

    tracing::info!(user = %user.id, articles, feedback, removed, "account deleted");
    Ok(deleted(removed))
}

/// `GET /api/users/me/articles`
pub async fn my_articles(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ArticleResponse>>, AppError> {
    let articles = state.storage.articles_by_owner(&user.id).await?;
    Ok(Json(responses(articles)))
}

/// `GET /api/users/me/preferences`
pub async fn preferences(State(state): State<AppState>, user: AuthUser) -> Result<Json<Preferences>, AppError> {
    let stored = load_user(&state, &user).await?;
    Ok(Json(stored.preferences.resolve()))
}

/// `PUT /api/users/me/preferences`
pub async fn update_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<StoredPreferences>,
) -> Result<Json<Value>, AppError> {
    if update.is_empty() {
        return Ok(updated(false));
    }
    let changed = state.users.update_preferences(&user.id, &update).await?;
    Ok(updated(changed))
}

/// `GET /api/users/me/api-keys`
pub async fn api_keys(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<ApiKey>>, AppError> {
    Ok(Json(load_user(&state, &user).await?.api_keys))
}

/// `POST /api/users/me/api-keys`
pub async fn create_api_key(State(state): State<AppState>, user: AuthUser) -> Result<Json<ApiKey>, AppError> {
    let entry = ApiKey {
        id: ObjectId::new().to_hex(),
        key: generate_api_key(),
        created_at: chrono::Utc::now().to_rfc3339(),
        label: "default".to_string(),
    };
    state.users.add_api_key(&user.id, &entry).await?;
    tracing::info!(user = %user.id, key_id = %entry.id, "api key created");
    Ok(Json(entry))
}

/// `DELETE /api/users/me/api-keys/{key_id}`
pub async fn delete_api_key(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.users.remove_api_key(&user.id, &key_id).await?;
    Ok(deleted(removed))
}

#[derive(Debug, Deserialize)]
pub struct WebhookInput {
    pub url: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub events: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// `GET /api/users/me/webhooks`
pub async fn webhooks(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Webhook>>, AppError> {
    Ok(Json(load_user(&state, &user).await?.webhooks))
}

/// `POST /api/users/me/webhooks`
pub async fn create_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<WebhookInput>,
) -> Result<Json<Webhook>, AppError> {
    url::Url::parse(&input.url).map_err(|_| AppError::BadRequest("Invalid webhook url".into()))?;

    let webhook = Webhook {
        id: ObjectId::new().to_hex(),
        url: input.url,
        enabled: input.enabled,
        events: input.events,
    };
    state.users.add_webhook(&user.id, &webhook).await?;
    Ok(Json(webhook))
}

/// `PUT /api/users/me/webhooks/{webhook_id}`
pub async fn update_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    Path(webhook_id): Path<String>,
    Json(update): Json<WebhookUpdate>,
) -> Result<Json<Value>, AppError> {
    state.users.update_webhook(&user.id, &webhook_id, &update).await?;
    Ok(updated(true))
}

/// `DELETE /api/users/me/webhooks/{webhook_id}`
pub async fn delete_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    Path(webhook_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let removed = state.users.remove_webhook(&user.id, &webhook_id).await?;
    Ok(deleted(removed))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/users/me/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(change): Json<PasswordChange>,
) -> Result<Json<Value>, AppError> {
    let stored = state.users.find_by_id(&user.id).await?;
    let current_ok = match stored.as_ref().and_then(|u| u.password_hash.as_deref()) {
        Some(hash) => verify_in_background(&change.current_password, hash).await,
        None => false,
    };
    if !current_ok {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let hash = hash_in_background(&change.new_password).await?;
    state.users.set_password_hash(&user.id, &hash).await?;
    Ok(updated(true))
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorQuery {
    pub enabled: bool,
}

/// `GET /api/users/me/2fa`
pub async fn two_factor(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, AppError> {
    let stored = load_user(&state, &user).await?;
    Ok(Json(json!({ "enabled": stored.two_factor_enabled })))
}

/// `POST /api/users/me/2fa?enabled=`
pub async fn set_two_factor(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TwoFactorQuery>,
) -> Result<Json<Value>, AppError> {
    state.users.set_two_factor(&user.id, query.enabled).await?;
    Ok(Json(json!({ "enabled": query.enabled })))
}

/// `GET /api/users/me/notifications`
pub async fn notifications(State(state): State<AppState>, user: AuthUser) -> Result<Json<Notifications>, AppError> {
    Ok(Json(load_user(&state, &user).await?.notifications.resolve()))
}

/// `PUT /api/users/me/notifications`
pub async fn update_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Json(settings): Json<StoredNotifications>,
) -> Result<Json<Value>, AppError> {
    state.users.set_notifications(&user.id, &settings).await?;
    Ok(updated(true))
}

/// `GET /api/users/me/integrations`
pub async fn integrations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BTreeMap<String, Integration>>, AppError> {
    Ok(Json(load_user(&state, &user).await?.resolved_integrations()))
}

#[derive(Debug, Deserialize)]
pub struct IntegrationToggle {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct IntegrationSettings {
    pub settings: Value,
}

/// `PUT /api/users/me/integrations/{provider}/toggle`
pub async fn toggle_integration(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
    Json(toggle): Json<IntegrationToggle>,
) -> Result<Json<Value>, AppError> {
    validate_provider(&provider)?;
    let changed = state
        .users
        .set_integration_enabled(&user.id, &provider, toggle.enabled)
        .await?;
    Ok(updated(changed))
}

/// `POST /api/users/me/integrations/{provider}/config`
pub async fn configure_integration(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
    Json(config): Json<IntegrationSettings>,
) -> Result<Json<Value>, AppError> {
    validate_provider(&provider)?;
    let changed = state
        .users
        .set_integration_settings(&user.id, &provider, &config.settings)
        .await?;
    Ok(updated(changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::memory_state_with;
    use crate::auth::password::{hash_password, verify_password};
    use crate::db::models::Feedback;
    use crate::db::user_repository::MockUserRepository;
    use crate::storage::gateway::ArticleInput;

    fn caller(user: &User) -> AuthUser {
        AuthUser::from(user)
    }

    #[test]
    fn api_keys_are_prefixed_and_url_safe() {
        let key = generate_api_key();
        assert!(key.starts_with("ib_"));
        let body = &key[3..];
        assert_eq!(body.len(), 32);
        assert!(body.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(generate_api_key(), key);
    }

    #[test]
    fn provider_names_are_restricted() {
        assert!(validate_provider("google_drive").is_ok());
        assert!(validate_provider("slack").is_ok());
        assert!(validate_provider("").is_err());
        assert!(validate_provider("a.b").is_err());
        assert!(validate_provider("$set").is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }

    #[tokio::test]
    async fn empty_profile_update_changes_nothing() {
        let user = User::new("ada@example.com", "Ada", "L");
        let (state, _) = memory_state_with(MockUserRepository::new());

        let Json(body) = update_me(State(state), caller(&user), Json(ProfileUpdate::default()))
            .await
            .unwrap();
        assert_eq!(body["updated"], false);
    }

    #[tokio::test]
    async fn taken_email_is_refused() {
        let user = User::new("ada@example.com", "Ada", "L");
        let other = User::new("grace@example.com", "Grace", "H");

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(other.clone())));
        users.expect_update_profile().never();
        let (state, _) = memory_state_with(users);

        let update = ProfileUpdate {
            email: Some("grace@example.com".to_string()),
            ..Default::default()
        };
        let err = update_me(State(state), caller(&user), Json(update)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email already in use"));
    }

    #[tokio::test]
    async fn keeping_own_email_is_allowed() {
        let user = User::new("ada@example.com", "Ada", "L");
        let same = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(same.clone())));
        users.expect_update_profile().times(1).returning(|_, _| Ok(true));
        let (state, _) = memory_state_with(users);

        let update = ProfileUpdate {
            email: Some("ada@example.com".to_string()),
            first_name: Some("Augusta".to_string()),
            ..Default::default()
        };
        let Json(body) = update_me(State(state), caller(&user), Json(update)).await.unwrap();
        assert_eq!(body["updated"], true);
    }

    #[tokio::test]
    async fn wrong_current_password_is_rejected() {
        let mut user = User::new("ada@example.com", "Ada", "L");
        user.password_hash = Some(hash_password("right-one").unwrap());
        let stored = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        users.expect_set_password_hash().never();
        let (state, _) = memory_state_with(users);

        let change = PasswordChange {
            current_password: "wrong-one".to_string(),
            new_password: "new-secret".to_string(),
        };
        let err = change_password(State(state), caller(&user), Json(change))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Current password is incorrect"));
    }

    #[tokio::test]
    async fn password_change_stores_new_hash() {
        let mut user = User::new("ada@example.com", "Ada", "L");
        user.password_hash = Some(hash_password("right-one").unwrap());
        let stored = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        users
            .expect_set_password_hash()
            .withf(|_, hash| verify_password("new-secret", hash))
            .times(1)
            .returning(|_, _| Ok(true));
        let (state, _) = memory_state_with(users);

        let change = PasswordChange {
            current_password: "right-one".to_string(),
            new_password: "new-secret".to_string(),
        };
        let Json(body) = change_password(State(state), caller(&user), Json(change))
            .await
            .unwrap();
        assert_eq!(body["updated"], true);
    }

    #[tokio::test]
    async fn oauth_account_cannot_change_password() {
        let user = User::new("oauth@example.com", "", "");
        let stored = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        let (state, _) = memory_state_with(users);

        let change = PasswordChange {
            current_password: String::new(),
            new_password: "new-secret".to_string(),
        };
        assert!(change_password(State(state), caller(&user), Json(change)).await.is_err());
    }

    #[tokio::test]
    async fn settings_reads_fall_back_to_defaults() {
        let user = User::new("ada@example.com", "Ada", "L");
        let stored = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        let (state, _) = memory_state_with(users);

        let Json(prefs) = preferences(State(state.clone()), caller(&user)).await.unwrap();
        assert_eq!(prefs, Preferences::default());

        let Json(notif) = notifications(State(state.clone()), caller(&user)).await.unwrap();
        assert!(notif.email && notif.push);

        let Json(ints) = integrations(State(state.clone()), caller(&user)).await.unwrap();
        assert_eq!(ints.len(), 6);

        let Json(tfa) = two_factor(State(state), caller(&user)).await.unwrap();
        assert_eq!(tfa["enabled"], false);
    }

    #[tokio::test]
    async fn created_api_key_is_stored() {
        let user = User::new("ada@example.com", "Ada", "L");
        let id = user.id_hex();

        let mut users = MockUserRepository::new();
        users
            .expect_add_api_key()
            .withf(move |uid, key| uid == id && key.key.starts_with("ib_") && key.label == "default")
            .times(1)
            .returning(|_, _| Ok(true));
        let (state, _) = memory_state_with(users);

        let Json(key) = create_api_key(State(state), caller(&user)).await.unwrap();
        assert_eq!(key.id.len(), 24);
    }

    #[tokio::test]
    async fn invalid_webhook_url_is_rejected() {
        let user = User::new("ada@example.com", "Ada", "L");
        let mut users = MockUserRepository::new();
        users.expect_add_webhook().never();
        let (state, _) = memory_state_with(users);

        let input = WebhookInput {
            url: "not a url".to_string(),
            enabled: true,
            events: Vec::new(),
        };
        let err = create_webhook(State(state), caller(&user), Json(input)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn account_deletion_cascades() {
        let user = User::new("ada@example.com", "Ada", "L");
        let id = user.id_hex();
        let owner = user.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(owner.clone())));
        let expected = id.clone();
        users
            .expect_delete()
            .withf(move |uid| uid == expected)
            .times(1)
            .returning(|_| Ok(true));
        let (state, _) = memory_state_with(users);

        let input = ArticleInput {
            title: "Mine".to_string(),
            content: "Something worth keeping".to_string(),
            tags: Vec::new(),
        };
        state.storage.save_article(input, Some(&id)).await.unwrap();
        state
            .records
            .insert_feedback(&Feedback {
                id: ObjectId::new(),
                article_id: "x".to_string(),
                helpful: true,
                comments: None,
                user_id: Some(id.clone()),
            })
            .await
            .unwrap();

        let Json(body) = delete_me(State(state.clone()), caller(&user)).await.unwrap();
        assert_eq!(body["deleted"], true);
        assert!(state.storage.articles_by_owner(&id).await.unwrap().is_empty());
        assert_eq!(state.records.delete_feedback_by_user(&id).await.unwrap(), 0);
    }
}
