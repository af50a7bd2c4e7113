use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::Binary;
use serde::{Deserialize, Serialize};

use crate::outcome::Processing;

/// Extractive and abstractive summary stored with a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summaries {
    pub extractive: String,
    pub abstractive: String,
}

/// An uploaded document, stored in the `documents` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub object_id: ObjectId,
    /// Public uuid v4 identifier.
    pub id: String,
    pub title: String,
    pub original_filename: String,
    pub content: String,
    pub summary: Summaries,
    pub tags: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub file_size: i64,
    /// Extension including the dot, e.g. `.pdf`.
    pub file_type: String,
    pub owner_id: String,
    /// Raw upload. Left out of metadata reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<Binary>,
    pub processing: Processing,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Document {
    pub fn file_bytes(&self) -> Option<&[u8]> {
        self.file_data
            .as_ref()
            .map(|b| b.bytes.as_slice())
            .filter(|b| !b.is_empty())
    }
}

pub fn binary(bytes: Vec<u8>) -> Binary {
    Binary {
        subtype: BinarySubtype::Generic,
        bytes,
    }
}

/// A knowledge-base article, stored in the `articles` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Only populated when the owner opted in to automatic tags.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Local,
    Google,
    Microsoft,
}

/// Preferences as stored; unset fields take the defaults of [`Preferences`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate_tags: Option<bool>,
}

/// Effective user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub language: String,
    pub theme: String,
    pub ai_model: String,
    pub auto_generate_tags: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            theme: "Light".to_string(),
            ai_model: "GPT-4 (Recommended)".to_string(),
            auto_generate_tags: true,
        }
    }
}

impl StoredPreferences {
    pub fn resolve(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            language: self.language.clone().unwrap_or(defaults.language),
            theme: self.theme.clone().unwrap_or(defaults.theme),
            ai_model: self.ai_model.clone().unwrap_or(defaults.ai_model),
            auto_generate_tags: self.auto_generate_tags.unwrap_or(defaults.auto_generate_tags),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Preferences> for StoredPreferences {
    fn from(p: Preferences) -> Self {
        Self {
            language: Some(p.language),
            theme: Some(p.theme),
            ai_model: Some(p.ai_model),
            auto_generate_tags: Some(p.auto_generate_tags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub key: String,
    /// ISO-8601 creation time.
    pub created_at: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    pub enabled: bool,
    #[serde(default)]
    pub events: Vec<String>,
}

/// Partial webhook update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub enabled: Option<bool>,
    pub events: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

pub const INTEGRATION_PROVIDERS: [&str; 6] = [
    "google_drive",
    "onedrive",
    "dropbox",
    "office365",
    "slack",
    "teams",
];

/// Notification settings as stored, merged over defaults on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredNotifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
    #[serde(default)]
    pub types: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notifications {
    pub email: bool,
    pub push: bool,
    pub types: BTreeMap<String, bool>,
}

impl StoredNotifications {
    pub fn resolve(&self) -> Notifications {
        let mut types: BTreeMap<String, bool> = [
            ("processing_complete", true),
            ("weekly_report", true),
            ("feature_updates", false),
            ("api_usage_alerts", false),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        types.extend(self.types.clone());

        Notifications {
            email: self.email.unwrap_or(true),
            push: self.push.unwrap_or(true),
            types,
        }
    }
}

/// A user account, stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    /// Absent for accounts created through OAuth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub auth_provider: AuthProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub preferences: StoredPreferences,
    #[serde(default)]
    pub integrations: BTreeMap<String, Integration>,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
    #[serde(default)]
    pub webhooks: Vec<Webhook>,
    #[serde(default)]
    pub notifications: StoredNotifications,
    #[serde(default)]
    pub two_factor_enabled: bool,
}

impl User {
    /// A new local or OAuth account with nothing configured yet.
    pub fn new(email: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            email: email.into(),
            password_hash: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            auth_provider: AuthProvider::Local,
            oauth_id: None,
            picture: None,
            preferences: StoredPreferences::default(),
            integrations: BTreeMap::new(),
            api_keys: Vec::new(),
            webhooks: Vec::new(),
            notifications: StoredNotifications::default(),
            two_factor_enabled: false,
        }
    }

    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }

    /// Stored integrations layered over the known providers, all disabled.
    pub fn resolved_integrations(&self) -> BTreeMap<String, Integration> {
        let mut all: BTreeMap<String, Integration> = INTEGRATION_PROVIDERS
            .iter()
            .map(|p| (p.to_string(), Integration::default()))
            .collect();
        all.extend(self.integrations.clone());
        all
    }
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }
}

/// Article feedback, append-only in the `feedback` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub article_id: String,
    pub helpful: bool,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A support request, append-only in the `support` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub category: String,
    pub priority: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// A summary produced through `/api/summarize`, kept with its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub text: String,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_fall_back_to_defaults() {
        let stored = StoredPreferences {
            theme: Some("Dark".to_string()),
            auto_generate_tags: Some(false),
            ..Default::default()
        };
        let prefs = stored.resolve();
        assert_eq!(prefs.language, "English");
        assert_eq!(prefs.theme, "Dark");
        assert_eq!(prefs.ai_model, "GPT-4 (Recommended)");
        assert!(!prefs.auto_generate_tags);
    }

    #[test]
    fn notifications_merge_over_defaults() {
        let stored = StoredNotifications {
            push: Some(false),
            types: [("feature_updates".to_string(), true)].into_iter().collect(),
            ..Default::default()
        };
        let resolved = stored.resolve();
        assert!(resolved.email);
        assert!(!resolved.push);
        assert_eq!(resolved.types["feature_updates"], true);
        assert_eq!(resolved.types["weekly_report"], true);
        assert_eq!(resolved.types.len(), 4);
    }

    #[test]
    fn integrations_include_every_known_provider() {
        let mut user = User::new("a@b.c", "A", "B");
        user.integrations.insert(
            "slack".to_string(),
            Integration {
                enabled: true,
                settings: None,
            },
        );
        let all = user.resolved_integrations();
        assert_eq!(all.len(), INTEGRATION_PROVIDERS.len());
        assert!(all["slack"].enabled);
        assert!(!all["dropbox"].enabled);
    }

    #[test]
    fn user_document_omits_missing_password() {
        let user = User::new("oauth@example.com", "", "");
        let doc = mongodb::bson::to_document(&user).unwrap();
        assert!(!doc.contains_key("password_hash"));
        assert_eq!(doc.get_str("auth_provider").unwrap(), "local");
    }
}
