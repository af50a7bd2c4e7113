use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthUser;
use crate::db::models::Article;
use crate::error::AppError;
use crate::storage::gateway::{ArticleInput, StorageGateway};

const MAX_PAGE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id.to_hex(),
            title: article.title,
            content: article.content,
            tags: article.tags,
        }
    }
}

pub fn responses(articles: Vec<Article>) -> Vec<ArticleResponse> {
    articles.into_iter().map(ArticleResponse::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tag: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub semantic: bool,
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// `GET /api/articles`: a search when `q` is given, otherwise a page of the
/// newest articles (optionally for one tag).
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ArticleResponse>>, AppError> {
    let limit = query.limit.clamp(1, MAX_PAGE);
    let articles = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) if query.semantic => state.storage.search_articles_semantic(q, limit).await?,
        Some(q) => state.storage.search_articles(q, limit).await?,
        None => {
            state
                .storage
                .get_all_articles(query.tag, query.skip, limit)
                .await?
        }
    };
    Ok(Json(responses(articles)))
}

/// `POST /api/articles`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ArticleInput>,
) -> Result<Json<ArticleResponse>, AppError> {
    validate(&input)?;
    let article = state.storage.save_article(input, Some(&user.id)).await?;
    Ok(Json(article.into()))
}

/// `GET /api/articles/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleResponse>, AppError> {
    let article = state
        .storage
        .get_article_by_id(&id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(article.into()))
}

/// `PUT /api/articles/{id}`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ArticleInput>,
) -> Result<Json<ArticleResponse>, AppError> {
    validate(&input)?;
    ensure_can_modify(&state.storage, &id, &user).await?;
    let article = state
        .storage
        .update_article(&id, input, &user.id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(article.into()))
}

/// `DELETE /api/articles/{id}`
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_can_modify(&state.storage, &id, &user).await?;
    if !state.storage.delete_article(&id).await? {
        return Err(not_found());
    }
    Ok(Json(json!({"deleted": true})))
}

fn not_found() -> AppError {
    AppError::NotFound("Article not found".into())
}

fn validate(input: &ArticleInput) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    Ok(())
}

/// Owned articles may only be changed by their owner; unowned ones by anyone
/// signed in.
async fn ensure_can_modify(storage: &StorageGateway, id: &str, user: &AuthUser) -> Result<(), AppError> {
    let article = storage.get_article_by_id(id).await?.ok_or_else(not_found)?;
    match article.owner_id {
        Some(owner) if owner != user.id => {
            tracing::warn!(article = id, owner = %owner, caller = %user.id, "article change refused");
            Err(AppError::Forbidden("Only the owner can modify this article".into()))
        }
        _ => Ok(()),
    }
}
