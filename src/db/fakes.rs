//! In-memory repositories for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::article_repository::{ArticleRepository, TagCount};
use crate::db::models::{Article, Document, Feedback, SummaryRecord, SupportTicket};
use crate::db::record_repository::RecordRepository;
use crate::db::repository::{parse_object_id, DocumentRepository};
use crate::error::AppError;

#[derive(Default)]
pub struct MemoryDocuments {
    pub documents: Mutex<Vec<Document>>,
}

#[async_trait]
impl DocumentRepository for MemoryDocuments {
    async fn insert(&self, doc: &Document) -> Result<(), AppError> {
        self.documents.lock().unwrap().push(doc.clone());
        Ok(())
    }

    async fn find(&self, id: &str, with_file: bool) -> Result<Option<Document>, AppError> {
        let oid = parse_object_id(id);
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| match oid {
                Some(oid) => d.object_id == oid,
                None => d.id == id,
            })
            .cloned()
            .map(|mut d| {
                if !with_file {
                    d.file_data = None;
                }
                d
            }))
    }
}

#[derive(Default)]
pub struct MemoryArticles {
    pub articles: Mutex<Vec<Article>>,
}

#[async_trait]
impl ArticleRepository for MemoryArticles {
    async fn insert(&self, article: &Article) -> Result<(), AppError> {
        self.articles.lock().unwrap().push(article.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Article>, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        Ok(self.articles.lock().unwrap().iter().find(|a| a.id == oid).cloned())
    }

    async fn replace(&self, article: &Article) -> Result<bool, AppError> {
        let mut articles = self.articles.lock().unwrap();
        match articles.iter_mut().find(|a| a.id == article.id) {
            Some(slot) => {
                *slot = article.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(false);
        };
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != oid);
        Ok(articles.len() < before)
    }

    async fn list(&self, tag: Option<String>, skip: u64, limit: i64) -> Result<Vec<Article>, AppError> {
        let articles = self.articles.lock().unwrap();
        Ok(articles
            .iter()
            .rev()
            .filter(|a| tag.as_ref().map_or(true, |t| a.tags.contains(t)))
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn text_search(&self, query: &str, limit: i64) -> Result<Vec<Article>, AppError> {
        let query = query.to_lowercase();
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                query.split_whitespace().any(|w| {
                    a.title.to_lowercase().contains(w) || a.content.to_lowercase().contains(w)
                })
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn keyword_search(&self, keywords: &[String], limit: i64) -> Result<Vec<Article>, AppError> {
        let mut scored: Vec<(usize, Article)> = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .map(|a| (a.keywords.iter().filter(|k| keywords.contains(k)).count(), a.clone()))
            .filter(|(n, _)| *n > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(limit as usize).map(|(_, a)| a).collect())
    }

    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>, AppError> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for article in self.articles.lock().unwrap().iter() {
            for tag in &article.tags {
                *counts.entry(tag.clone()).or_default() += 1;
            }
        }
        let mut counts: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        counts.truncate(limit as usize);
        Ok(counts)
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Article>, AppError> {
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect())
    }

    async fn delete_by_owner(&self, owner_id: &str) -> Result<u64, AppError> {
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.owner_id.as_deref() != Some(owner_id));
        Ok((before - articles.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryRecords {
    pub feedback: Mutex<Vec<Feedback>>,
    pub tickets: Mutex<Vec<SupportTicket>>,
    pub summaries: Mutex<Vec<SummaryRecord>>,
}

#[async_trait]
impl RecordRepository for MemoryRecords {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), AppError> {
        self.feedback.lock().unwrap().push(feedback.clone());
        Ok(())
    }

    async fn delete_feedback_by_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut feedback = self.feedback.lock().unwrap();
        let before = feedback.len();
        feedback.retain(|f| f.user_id.as_deref() != Some(user_id));
        Ok((before - feedback.len()) as u64)
    }

    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<(), AppError> {
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(())
    }

    async fn insert_summary(&self, record: &SummaryRecord) -> Result<(), AppError> {
        self.summaries.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_summaries(&self, skip: u64, limit: i64) -> Result<Vec<SummaryRecord>, AppError> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_summary(&self, id: &str) -> Result<Option<SummaryRecord>, AppError> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        Ok(self.summaries.lock().unwrap().iter().find(|s| s.id == oid).cloned())
    }
}
