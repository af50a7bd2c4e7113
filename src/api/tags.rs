use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::db::article_repository::TagCount;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// `GET /api/tags`: most used article tags first.
pub async fn list(State(state): State<AppState>, Query(query): Query<TagQuery>) -> Result<Json<Vec<TagCount>>, AppError> {
    let counts = state.storage.tag_counts(query.limit.clamp(1, 100)).await?;
    Ok(Json(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::memory_state;
    use crate::storage::gateway::ArticleInput;

    #[tokio::test]
    async fn counts_tags_across_articles() {
        let (state, _) = memory_state();
        for tags in [vec!["rust", "async"], vec!["rust"], vec!["python"]] {
            let input = ArticleInput {
                title: "T".to_string(),
                content: "Body".to_string(),
                tags: tags.into_iter().map(str::to_string).collect(),
            };
            state.storage.save_article(input, None).await.unwrap();
        }

        let Json(counts) = list(State(state), Query(TagQuery { limit: 20 })).await.unwrap();
        assert_eq!(
            counts[0],
            TagCount {
                tag: "rust".to_string(),
                count: 2
            }
        );
        assert_eq!(counts.len(), 3);
    }
}
