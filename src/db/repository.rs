use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document as BsonDocument};

use crate::db::models::Document;
use crate::error::AppError;

/// `ObjectId` for a 24-hex id, `None` for anything else (e.g. a uuid).
pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    if id.len() != 24 {
        return None;
    }
    ObjectId::parse_str(id).ok()
}

/// Filter matching a document by Mongo `_id` (24-hex ids) or public uuid.
pub fn document_filter(id: &str) -> BsonDocument {
    match parse_object_id(id) {
        Some(oid) => doc! { "_id": oid },
        None => doc! { "id": id },
    }
}

/// Repository trait for uploaded documents.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a freshly processed upload.
    async fn insert(&self, doc: &Document) -> Result<(), AppError>;

    /// Find a document by Mongo id or uuid. `with_file` also loads the raw bytes.
    async fn find(&self, id: &str, with_file: bool) -> Result<Option<Document>, AppError>;
}

pub struct MongoDocumentRepository {
    collection: mongodb::Collection<Document>,
}

impl MongoDocumentRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("documents"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for MongoDocumentRepository {
    async fn insert(&self, doc: &Document) -> Result<(), AppError> {
        self.collection
            .insert_one(doc)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn find(&self, id: &str, with_file: bool) -> Result<Option<Document>, AppError> {
        use mongodb::options::FindOneOptions;

        let mut options = FindOneOptions::default();
        if !with_file {
            options.projection = Some(doc! { "file_data": 0 });
        }

        self.collection
            .find_one(document_filter(id))
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_ids_query_by_object_id() {
        let filter = document_filter("507f1f77bcf86cd799439011");
        assert!(filter.get_object_id("_id").is_ok());
    }

    #[test]
    fn other_ids_query_by_uuid() {
        let id = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
        let filter = document_filter(id);
        assert_eq!(filter.get_str("id").unwrap(), id);

        // 24 characters but not hex
        let filter = document_filter("zzzzzzzzzzzzzzzzzzzzzzzz");
        assert!(filter.get_str("id").is_ok());
    }
}
