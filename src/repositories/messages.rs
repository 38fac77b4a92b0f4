use sqlx::SqlitePool;

use crate::core::time::now_rfc3339;
use crate::models::message::Message;

pub async fn create_message(
    pool: &SqlitePool,
    conversation_id: i64,
    role: &str,
    content: &str,
) -> Result<Message, String> {
    let now = now_rfc3339();
    let id = sqlx::query(
        "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| e.to_string())?
    .last_insert_rowid();

    Ok(Message {
        id,
        conversation_id,
        role: role.to_string(),
        content: content.to_string(),
        created_at: now,
    })
}

/// Rows come back in storage order; callers sort chronologically.
pub async fn list_messages_by_conversation(
    pool: &SqlitePool,
    conversation_id: i64,
) -> Result<Vec<Message>, String> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE conversation_id = ? ORDER BY id ASC")
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .map_err(|e| e.to_string())
}
