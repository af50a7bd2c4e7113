use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson};
use serde::Serialize;

use crate::db::models::Article;
use crate::db::repository::parse_object_id;
use crate::error::AppError;

/// How many articles carry a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Repository trait for articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn insert(&self, article: &Article) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError>;

    /// Overwrite the stored article with the same id. Returns `false` if none matched.
    async fn replace(&self, article: &Article) -> Result<bool, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Newest first, optionally restricted to one tag.
    async fn list(&self, tag: Option<String>, skip: u64, limit: i64) -> Result<Vec<Article>, AppError>;

    /// Full-text search over title and content, best matches first.
    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<Article>, AppError>;

    /// Articles sharing at least one keyword, most shared keywords first.
    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>, AppError>;

    /// Most used tags first.
    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>, AppError>;

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Article>, AppError>;

    async fn delete_by_owner(&self, owner_id: &str) -> Result<u64, AppError>;
}

pub struct MongoArticleRepository {
    collection: mongodb::Collection<Article>,
}

impl MongoArticleRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("articles"),
        }
    }

    /// The text index backing [`ArticleRepository::text_search`].
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::IndexModel;

        let text = IndexModel::builder()
            .keys(doc! { "title": "text", "content": "text" })
            .build();
        let owner = IndexModel::builder().keys(doc! { "owner_id": 1 }).build();

        self.collection
            .create_indexes([text, owner])
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn aggregate_articles(
        &self,
        pipeline: Vec<mongodb::bson::Document>,
    ) -> Result<Vec<Article>, AppError> {
        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut articles = Vec::new();
        while let Some(row) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let article: Article = mongodb::bson::from_document(row)
                .map_err(|e| AppError::Database(e.to_string()))?;
            articles.push(article);
        }
        Ok(articles)
    }
}

fn count_of(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Double(n)) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

#[async_trait]
impl ArticleRepository for MongoArticleRepository {
    async fn insert(&self, article: &Article) -> Result<(), AppError> {
        self.collection
            .insert_one(article)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        self.collection
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn replace(&self, article: &Article) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": article.id }, article)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.matched_count > 0)
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

    async fn list(&self, tag: Option<String>, skip: u64, limit: i64) -> Result<Vec<Article>, AppError> {
        let filter = match tag {
            Some(tag) => doc! { "tags": tag },
            None => doc! {},
        };

        self.collection
            .find(filter)
            .sort(doc! { "_id": -1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<Article>, AppError> {
        self.collection
            .find(doc! { "$text": { "$search": query } })
            .sort(doc! { "score": { "$meta": "textScore" } })
            .limit(limit)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>, AppError> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = vec![
            doc! { "$addFields": {
                "keyword_matches": {
                    "$size": { "$setIntersection": [ { "$ifNull": ["$keywords", []] }, keywords.to_vec() ] }
                }
            }},
            doc! { "$match": { "keyword_matches": { "$gt": 0 } } },
            doc! { "$sort": { "keyword_matches": -1 } },
            doc! { "$limit": limit },
            doc! { "$project": { "keyword_matches": 0 } },
        ];
        self.aggregate_articles(pipeline).await
    }

    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>, AppError> {
        let pipeline = vec![
            doc! { "$unwind": { "path": "$tags", "preserveNullAndEmptyArrays": false } },
            doc! { "$group": { "_id": "$tags", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
            doc! { "$limit": limit },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut counts = Vec::new();
        while let Some(row) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let Ok(tag) = row.get_str("_id") else {
                continue;
            };
            counts.push(TagCount {
                tag: tag.to_string(),
                count: count_of(row.get("count")),
            });
        }
        Ok(counts)
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Article>, AppError> {
        self.collection
            .find(doc! { "owner_id": owner_id })
            .sort(doc! { "_id": -1 })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_by_owner(&self, owner_id: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(doc! { "owner_id": owner_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.deleted_count)
    }
}
