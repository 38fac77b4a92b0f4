use sqlx::SqlitePool;
use tracing::info;

use crate::core::time::parse_timestamp;
use crate::models::conversation::Conversation;
use crate::models::message::{Message, ROLE_ASSISTANT, ROLE_USER};
use crate::repositories::{conversations, messages};
use crate::services::openrouter::ChatMessage;

const TITLE_MAX_CHARS: usize = 50;

/// First 50 characters of the prompt, with `...` when it was longer.
pub fn generate_title(initial_prompt: &str) -> String {
    let mut title: String = initial_prompt.chars().take(TITLE_MAX_CHARS).collect();
    if initial_prompt.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

pub async fn create_conversation(
    pool: &SqlitePool,
    model_id: &str,
    initial_prompt: &str,
    title: Option<String>,
) -> Result<Conversation, String> {
    let title = match title {
        Some(title) if !title.trim().is_empty() => title,
        _ => generate_title(initial_prompt),
    };
    let (conversation, _) =
        conversations::create_conversation_with_prompt(pool, &title, model_id, initial_prompt).await?;
    info!(
        "[CONVERSATION] created: id={}, model={}, title={}",
        conversation.id, conversation.model_id, conversation.title
    );
    Ok(conversation)
}

pub async fn continue_conversation(
    pool: &SqlitePool,
    conversation: &Conversation,
    prompt: &str,
) -> Result<Message, String> {
    messages::create_message(pool, conversation.id, ROLE_USER, prompt).await
}

pub async fn add_assistant_message(
    pool: &SqlitePool,
    conversation: &Conversation,
    content: &str,
) -> Result<Message, String> {
    messages::create_message(pool, conversation.id, ROLE_ASSISTANT, content).await
}

/// The conversation's messages in chronological order, as relay input.
pub async fn get_conversation_context(
    pool: &SqlitePool,
    conversation: &Conversation,
) -> Result<Vec<ChatMessage>, String> {
    let messages = messages::list_messages_by_conversation(pool, conversation.id).await?;
    Ok(order_context(messages))
}

pub fn order_context(mut messages: Vec<Message>) -> Vec<ChatMessage> {
    // Stable sort: equal timestamps keep insertion order.
    messages.sort_by_key(|m| parse_timestamp(&m.created_at));
    messages
        .into_iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content,
        })
        .collect()
}
