use sqlx::SqlitePool;

use crate::models::summary::Summary;

/// Inserts `summary` unless the chat-history entry already has one, and
/// returns whichever summary is stored afterwards.
pub async fn create_summary(pool: &SqlitePool, summary: &Summary) -> Result<Summary, String> {
    sqlx::query(
        "INSERT INTO summaries (id, chat_history_id, summary_text, tokens_count, type, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT(chat_history_id) DO NOTHING",
    )
    .bind(&summary.id)
    .bind(summary.chat_history_id)
    .bind(&summary.summary_text)
    .bind(summary.tokens_count)
    .bind(&summary.summary_type)
    .bind(&summary.created_at)
    .bind(&summary.updated_at)
    .execute(pool)
    .await
    .map_err(|e| e.to_string())?;

    get_summary_by_chat_history(pool, summary.chat_history_id)
        .await?
        .ok_or_else(|| "summary missing after insert".to_string())
}

pub async fn get_summary_by_chat_history(
    pool: &SqlitePool,
    chat_history_id: i64,
) -> Result<Option<Summary>, String> {
    sqlx::query_as::<_, Summary>("SELECT * FROM summaries WHERE chat_history_id = ?")
        .bind(chat_history_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_summaries(pool: &SqlitePool) -> Result<Vec<Summary>, String> {
    sqlx::query_as::<_, Summary>("SELECT * FROM summaries ORDER BY created_at ASC")
        .fetch_all(pool)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_in_memory;
    use crate::models::chat_history::NewChatHistory;
    use crate::repositories::chat_histories::create_chat_history;

    async fn history_id(pool: &SqlitePool) -> i64 {
        let data = NewChatHistory {
            prompt: "p".to_string(),
            model: "m".to_string(),
            response: "r".to_string(),
            ..NewChatHistory::default()
        };
        create_chat_history(pool, &data).await.unwrap().id
    }

    #[tokio::test]
    async fn keeps_first_summary_per_entry() {
        let pool = open_in_memory().await;
        let id = history_id(&pool).await;

        let first = create_summary(&pool, &Summary::new(id, "first".to_string(), 10, "intelligent"))
            .await
            .unwrap();
        let second = create_summary(&pool, &Summary::new(id, "second".to_string(), 20, "intelligent"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.summary_text, "first");
        assert_eq!(list_summaries(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_summary_is_none() {
        let pool = open_in_memory().await;
        let id = history_id(&pool).await;
        assert!(get_summary_by_chat_history(&pool, id).await.unwrap().is_none());
    }
}
