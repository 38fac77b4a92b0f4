use sqlx::SqlitePool;

use crate::core::sql_query::append_limit_offset_clause;
use crate::core::time::now_rfc3339;
use crate::models::conversation::Conversation;
use crate::models::message::{Message, ROLE_USER};

/// Inserts the conversation and its opening user message atomically.
pub async fn create_conversation_with_prompt(
    pool: &SqlitePool,
    title: &str,
    model_id: &str,
    initial_prompt: &str,
) -> Result<(Conversation, Message), String> {
    let now = now_rfc3339();
    let mut tx = pool.begin().await.map_err(|e| e.to_string())?;

    let conversation_id = sqlx::query(
        "INSERT INTO conversations (title, model_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(title)
    .bind(model_id)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?
    .last_insert_rowid();

    let message_id = sqlx::query(
        "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(conversation_id)
    .bind(ROLE_USER)
    .bind(initial_prompt)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| e.to_string())?
    .last_insert_rowid();

    tx.commit().await.map_err(|e| e.to_string())?;

    let conversation = Conversation {
        id: conversation_id,
        title: title.to_string(),
        model_id: model_id.to_string(),
        created_at: now.clone(),
    };
    let message = Message {
        id: message_id,
        conversation_id,
        role: ROLE_USER.to_string(),
        content: initial_prompt.to_string(),
        created_at: now,
    };
    Ok((conversation, message))
}

pub async fn get_conversation_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Conversation>, String> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| e.to_string())
}

pub async fn list_conversations(
    pool: &SqlitePool,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Conversation>, String> {
    let mut query = "SELECT * FROM conversations ORDER BY created_at DESC, id DESC".to_string();
    append_limit_offset_clause(&mut query, limit, offset);
    let mut q = sqlx::query_as::<_, Conversation>(&query);
    if let Some(l) = limit {
        q = q.bind(l);
        if offset > 0 {
            q = q.bind(offset);
        }
    }
    q.fetch_all(pool).await.map_err(|e| e.to_string())
}

/// Returns false when no conversation had that id. Messages go with it.
pub async fn delete_conversation(pool: &SqlitePool, id: i64) -> Result<bool, String> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| e.to_string())?;
    Ok(result.rows_affected() > 0)
}
