use axum::extract::State;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::models::AuthUser;
use crate::db::models::Feedback;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct FeedbackInput {
    pub article_id: String,
    pub helpful: bool,
    #[serde(default)]
    pub comments: Option<String>,
}

/// `POST /api/feedback`. Signed-in callers are recorded so their feedback
/// leaves with their account.
pub async fn create(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(input): Json<FeedbackInput>,
) -> Result<Json<Value>, AppError> {
    let feedback = Feedback {
        id: ObjectId::new(),
        article_id: input.article_id,
        helpful: input.helpful,
        comments: input.comments.filter(|c| !c.trim().is_empty()),
        user_id: user.map(|u| u.id),
    };
    state.records.insert_feedback(&feedback).await?;
    tracing::debug!(article = %feedback.article_id, helpful = feedback.helpful, "feedback recorded");
    Ok(Json(json!({ "id": feedback.id.to_hex() })))
}
