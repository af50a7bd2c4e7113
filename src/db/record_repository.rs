use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::db::models::{Feedback, SummaryRecord, SupportTicket};
use crate::db::repository::parse_object_id;
use crate::error::AppError;

/// Append-only records: article feedback, support tickets and saved summaries.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), AppError>;

    async fn delete_feedback_by_user(&self, user_id: &str) -> Result<u64, AppError>;

    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<(), AppError>;

    async fn insert_summary(&self, record: &SummaryRecord) -> Result<(), AppError>;

    /// Oldest first.
    async fn list_summaries(&self, skip: u64, limit: i64) -> Result<Vec<SummaryRecord>, AppError>;

    async fn find_summary(&self, id: &str) -> Result<Option<SummaryRecord>, AppError>;
}

pub struct MongoRecordRepository {
    feedback: mongodb::Collection<Feedback>,
    support: mongodb::Collection<SupportTicket>,
    summaries: mongodb::Collection<SummaryRecord>,
}

impl MongoRecordRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            feedback: db.collection("feedback"),
            support: db.collection("support"),
            summaries: db.collection("summaries"),
        }
    }
}

#[async_trait]
impl RecordRepository for MongoRecordRepository {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), AppError> {
        self.feedback
            .insert_one(feedback)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_feedback_by_user(&self, user_id: &str) -> Result<u64, AppError> {
        let result = self
            .feedback
            .delete_many(doc! { "user_id": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.deleted_count)
    }

    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<(), AppError> {
        self.support
            .insert_one(ticket)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn insert_summary(&self, record: &SummaryRecord) -> Result<(), AppError> {
        self.summaries
            .insert_one(record)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_summaries(&self, skip: u64, limit: i64) -> Result<Vec<SummaryRecord>, AppError> {
        self.summaries
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_summary(&self, id: &str) -> Result<Option<SummaryRecord>, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        self.summaries
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
