use async_trait::async_trait;
use mongodb::bson::{doc, to_bson, Document as BsonDocument};

use crate::db::models::{
    ApiKey, ProfileUpdate, StoredNotifications, StoredPreferences, User, Webhook, WebhookUpdate,
};
use crate::db::repository::parse_object_id;
use crate::error::AppError;

/// Repository trait for user accounts.
///
/// Mutations return whether the stored account actually changed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<bool, AppError>;

    /// Set the given preference fields, leaving the others untouched.
    async fn update_preferences(&self, id: &str, update: &StoredPreferences) -> Result<bool, AppError>;

    async fn set_password_hash(&self, id: &str, hash: &str) -> Result<bool, AppError>;

    async fn set_two_factor(&self, id: &str, enabled: bool) -> Result<bool, AppError>;

    async fn set_notifications(&self, id: &str, notifications: &StoredNotifications) -> Result<bool, AppError>;

    async fn add_api_key(&self, id: &str, key: &ApiKey) -> Result<bool, AppError>;

    async fn remove_api_key(&self, id: &str, key_id: &str) -> Result<bool, AppError>;

    async fn add_webhook(&self, id: &str, webhook: &Webhook) -> Result<bool, AppError>;

    async fn update_webhook(&self, id: &str, webhook_id: &str, update: &WebhookUpdate) -> Result<bool, AppError>;

    async fn remove_webhook(&self, id: &str, webhook_id: &str) -> Result<bool, AppError>;

    async fn set_integration_enabled(&self, id: &str, provider: &str, enabled: bool) -> Result<bool, AppError>;

    async fn set_integration_settings(
        &self,
        id: &str,
        provider: &str,
        settings: &serde_json::Value,
    ) -> Result<bool, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply `update` to the user with hex id `id`; unknown ids change nothing.
    async fn update(&self, id: &str, filter: BsonDocument, update: BsonDocument) -> Result<bool, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(false);
        };
        let mut filter = filter;
        filter.insert("_id", oid);

        let result = self
            .collection
            .update_one(filter, update)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.modified_count > 0)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<mongodb::bson::Bson, AppError> {
    to_bson(value).map_err(|e| AppError::Internal(format!("Failed to encode value: {e}")))
}

/// `$set` document for the non-`None` fields, each under `prefix`.
fn set_fields(prefix: &str, fields: BsonDocument) -> BsonDocument {
    fields
        .into_iter()
        .filter(|(_, v)| !matches!(v, mongodb::bson::Bson::Null))
        .map(|(k, v)| (format!("{prefix}{k}"), v))
        .collect()
}

fn profile_fields(update: &ProfileUpdate) -> BsonDocument {
    set_fields(
        "",
        doc! {
            "first_name": update.first_name.clone(),
            "last_name": update.last_name.clone(),
            "email": update.email.clone(),
        },
    )
}

fn webhook_fields(update: &WebhookUpdate) -> BsonDocument {
    set_fields(
        "webhooks.$.",
        doc! {
            "url": update.url.clone(),
            "enabled": update.enabled,
            "events": update.events.clone(),
        },
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.collection.insert_one(user).await.map_err(|e| {
            if e.to_string().contains("E11000") {
                AppError::BadRequest("Email already registered".into())
            } else {
                AppError::Database(e.to_string())
            }
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<bool, AppError> {
        let fields = profile_fields(update);
        if fields.is_empty() {
            return Ok(false);
        }
        self.update(id, doc! {}, doc! { "$set": fields }).await
    }

    async fn update_preferences(&self, id: &str, update: &StoredPreferences) -> Result<bool, AppError> {
        let fields = match encode(update)? {
            mongodb::bson::Bson::Document(d) => set_fields("preferences.", d),
            _ => BsonDocument::new(),
        };
        if fields.is_empty() {
            return Ok(false);
        }
        self.update(id, doc! {}, doc! { "$set": fields }).await
    }

    async fn set_password_hash(&self, id: &str, hash: &str) -> Result<bool, AppError> {
        self.update(id, doc! {}, doc! { "$set": { "password_hash": hash } })
            .await
    }

    async fn set_two_factor(&self, id: &str, enabled: bool) -> Result<bool, AppError> {
        self.update(id, doc! {}, doc! { "$set": { "two_factor_enabled": enabled } })
            .await
    }

    async fn set_notifications(&self, id: &str, notifications: &StoredNotifications) -> Result<bool, AppError> {
        let value = encode(notifications)?;
        self.update(id, doc! {}, doc! { "$set": { "notifications": value } })
            .await
    }

    async fn add_api_key(&self, id: &str, key: &ApiKey) -> Result<bool, AppError> {
        let value = encode(key)?;
        self.update(id, doc! {}, doc! { "$push": { "api_keys": value } })
            .await
    }

    async fn remove_api_key(&self, id: &str, key_id: &str) -> Result<bool, AppError> {
        self.update(id, doc! {}, doc! { "$pull": { "api_keys": { "id": key_id } } })
            .await
    }

    async fn add_webhook(&self, id: &str, webhook: &Webhook) -> Result<bool, AppError> {
        let value = encode(webhook)?;
        self.update(id, doc! {}, doc! { "$push": { "webhooks": value } })
            .await
    }

    async fn update_webhook(&self, id: &str, webhook_id: &str, update: &WebhookUpdate) -> Result<bool, AppError> {
        let fields = webhook_fields(update);
        if fields.is_empty() {
            return Ok(false);
        }
        self.update(id, doc! { "webhooks.id": webhook_id }, doc! { "$set": fields })
            .await
    }

    async fn remove_webhook(&self, id: &str, webhook_id: &str) -> Result<bool, AppError> {
        self.update(id, doc! {}, doc! { "$pull": { "webhooks": { "id": webhook_id } } })
            .await
    }

    async fn set_integration_enabled(&self, id: &str, provider: &str, enabled: bool) -> Result<bool, AppError> {
        let key = format!("integrations.{provider}.enabled");
        self.update(id, doc! {}, doc! { "$set": { key: enabled } }).await
    }

    async fn set_integration_settings(
        &self,
        id: &str,
        provider: &str,
        settings: &serde_json::Value,
    ) -> Result<bool, AppError> {
        let key = format!("integrations.{provider}.settings");
        let value = encode(settings)?;
        self.update(id, doc! {}, doc! { "$set": { key: value } }).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.deleted_count > 0)
    }
}
