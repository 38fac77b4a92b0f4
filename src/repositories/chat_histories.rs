use sqlx::SqlitePool;

use crate::core::sql_query::append_limit_offset_clause;
use crate::core::time::now_rfc3339;
use crate::models::chat_history::{ChatHistory, ChatHistoryRow, NewChatHistory};

pub async fn create_chat_history(pool: &SqlitePool, data: &NewChatHistory) -> Result<ChatHistory, String> {
    let now = now_rfc3339();
    let file_metadata = match data.file_metadata.as_ref() {
        Some(meta) => Some(serde_json::to_string(meta).map_err(|e| e.to_string())?),
        None => None,
    };

    let id = sqlx::query(
        "INSERT INTO chat_history (prompt, model, response, title, file_metadata, conversation_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&data.prompt)
    .bind(&data.model)
    .bind(&data.response)
    .bind(&data.title)
    .bind(file_metadata.as_deref())
    .bind(data.conversation_id)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| e.to_string())?
    .last_insert_rowid();

    Ok(ChatHistory {
        id,
        prompt: data.prompt.clone(),
        model: data.model.clone(),
        response: data.response.clone(),
        title: data.title.clone(),
        file_metadata: data.file_metadata.clone(),
        conversation_id: data.conversation_id,
        created_at: now,
    })
}

pub async fn get_chat_history_by_id(pool: &SqlitePool, id: i64) -> Result<Option<ChatHistory>, String> {
    let row = sqlx::query_as::<_, ChatHistoryRow>("SELECT * FROM chat_history WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| e.to_string())?;
    Ok(row.map(|r| r.to_entry()))
}

pub async fn list_chat_history(
    pool: &SqlitePool,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<ChatHistory>, String> {
    let mut query = "SELECT * FROM chat_history ORDER BY created_at DESC, id DESC".to_string();
    append_limit_offset_clause(&mut query, limit, offset);
    let mut q = sqlx::query_as::<_, ChatHistoryRow>(&query);
    if let Some(l) = limit {
        q = q.bind(l);
        if offset > 0 {
            q = q.bind(offset);
        }
    }
    let rows = q.fetch_all(pool).await.map_err(|e| e.to_string())?;
    Ok(rows.into_iter().map(|r| r.to_entry()).collect())
}

/// Entries belonging to the same thread as `entry`, oldest first.
///
/// Entries recorded for a conversation are grouped by conversation id. Older
/// entries without one are grouped by title, and an entry with neither forms
/// a thread of its own.
pub async fn list_thread(pool: &SqlitePool, entry: &ChatHistory) -> Result<Vec<ChatHistory>, String> {
    let result = if let Some(conversation_id) = entry.conversation_id {
        sqlx::query_as::<_, ChatHistoryRow>(
            "SELECT * FROM chat_history WHERE conversation_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    } else if let Some(title) = entry.title.as_ref() {
        sqlx::query_as::<_, ChatHistoryRow>(
            "SELECT * FROM chat_history WHERE conversation_id IS NULL AND title = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(title)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, ChatHistoryRow>("SELECT * FROM chat_history WHERE id = ?")
            .bind(entry.id)
            .fetch_all(pool)
            .await
    };
    let rows = result.map_err(|e| e.to_string())?;
    Ok(rows.into_iter().map(|r| r.to_entry()).collect())
}
