use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::db::article_repository::{ArticleRepository, TagCount};
use crate::db::models::{Article, Document};
use crate::db::repository::DocumentRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::nlp;

/// Fields a client supplies for an article.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Document and article persistence, plus the derived fields (keywords,
/// embedding) that every stored article carries.
#[derive(Clone)]
pub struct StorageGateway {
    documents: Arc<dyn DocumentRepository>,
    articles: Arc<dyn ArticleRepository>,
    users: Arc<dyn UserRepository>,
}

fn article_text(title: &str, content: &str) -> String {
    format!("{title}\n{content}")
}

impl StorageGateway {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        articles: Arc<dyn ArticleRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            documents,
            articles,
            users,
        }
    }

    pub async fn save_document(&self, doc: &Document) -> Result<String, AppError> {
        self.documents.insert(doc).await?;
        tracing::info!(id = %doc.id, filename = %doc.original_filename, "document saved");
        Ok(doc.id.clone())
    }

    /// Document metadata, without the raw upload.
    pub async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        self.documents.find(id, false).await
    }

    pub async fn get_document_with_file(&self, id: &str) -> Result<Option<Document>, AppError> {
        self.documents.find(id, true).await
    }

    /// Whether articles of `owner_id` get keywords: yes unless the owner
    /// explicitly turned automatic tags off.
    async fn wants_keywords(&self, owner_id: Option<&str>) -> bool {
        let Some(owner_id) = owner_id else {
            return true;
        };
        match self.users.find_by_id(owner_id).await {
            Ok(Some(user)) => user.preferences.auto_generate_tags.unwrap_or(true),
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "could not read preferences, generating keywords");
                true
            }
        }
    }

    async fn build_article(&self, id: ObjectId, input: ArticleInput, owner_id: Option<String>) -> Article {
        let text = article_text(&input.title, &input.content);
        let keywords = if self.wants_keywords(owner_id.as_deref()).await {
            nlp::simple_keywords(&text)
        } else {
            Vec::new()
        };

        Article {
            id,
            title: input.title,
            content: input.content,
            tags: input.tags,
            keywords,
            embedding: nlp::embed(&text),
            owner_id,
        }
    }

    pub async fn save_article(&self, input: ArticleInput, owner_id: Option<&str>) -> Result<Article, AppError> {
        let article = self
            .build_article(ObjectId::new(), input, owner_id.map(str::to_string))
            .await;
        self.articles.insert(&article).await?;
        tracing::info!(id = %article.id, keywords = article.keywords.len(), "article saved");
        Ok(article)
    }

    /// Replace an article's fields and recompute its keywords and embedding.
    /// The original owner is kept; unowned articles pass to `editor_id`.
    pub async fn update_article(
        &self,
        id: &str,
        input: ArticleInput,
        editor_id: &str,
    ) -> Result<Option<Article>, AppError> {
        let Some(existing) = self.articles.find_by_id(id).await? else {
            return Ok(None);
        };

        let owner = existing.owner_id.unwrap_or_else(|| editor_id.to_string());
        let article = self.build_article(existing.id, input, Some(owner)).await;
        if !self.articles.replace(&article).await? {
            return Ok(None);
        }
        Ok(Some(article))
    }

    pub async fn delete_article(&self, id: &str) -> Result<bool, AppError> {
        self.articles.delete(id).await
    }

    pub async fn get_article_by_id(&self, id: &str) -> Result<Option<Article>, AppError> {
        self.articles.find_by_id(id).await
    }

    pub async fn search_articles(&self, query: &str, limit: i64) -> Result<Vec<Article>, AppError> {
        self.articles.text_search(query, limit).await
    }

    /// Articles ranked by how many of the query's keywords they share.
    pub async fn search_articles_semantic(&self, query: &str, limit: i64) -> Result<Vec<Article>, AppError> {
        let keywords = nlp::simple_keywords(query);
        tracing::debug!(?keywords, "semantic article search");
        self.articles.keyword_search(&keywords, limit).await
    }

    pub async fn get_all_articles(
        &self,
        tag: Option<String>,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Article>, AppError> {
        self.articles.list(tag, skip, limit).await
    }

    pub async fn articles_by_owner(&self, owner_id: &str) -> Result<Vec<Article>, AppError> {
        self.articles.find_by_owner(owner_id).await
    }

    pub async fn delete_articles_by_owner(&self, owner_id: &str) -> Result<u64, AppError> {
        self.articles.delete_by_owner(owner_id).await
    }

    pub async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>, AppError> {
        self.articles.tag_counts(limit).await
    }
}
