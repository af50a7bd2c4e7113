use axum::extract::State;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::db::models::SupportTicket;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TicketInput {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Serialize)]
pub struct TicketReceipt {
    pub id: String,
    pub status: &'static str,
}

const RECEIVED: &str = "received";

/// `POST /api/support`
pub async fn create(State(state): State<AppState>, Json(input): Json<TicketInput>) -> Result<Json<TicketReceipt>, AppError> {
    if input.subject.trim().is_empty() || input.message.trim().is_empty() {
        return Err(AppError::BadRequest("Subject and message are required".into()));
    }

    let ticket = SupportTicket {
        id: ObjectId::new(),
        category: input.category,
        priority: input.priority,
        subject: input.subject,
        message: input.message,
        email: input.email,
        created_at: chrono::Utc::now(),
        status: RECEIVED.to_string(),
    };
    state.records.insert_ticket(&ticket).await?;

    tracing::info!(
        ticket = %ticket.id,
        category = %ticket.category,
        priority = %ticket.priority,
        subject = %ticket.subject,
        "support ticket received"
    );
    Ok(Json(TicketReceipt {
        id: ticket.id.to_hex(),
        status: RECEIVED,
    }))
}
