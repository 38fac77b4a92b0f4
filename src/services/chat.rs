use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use crate::models::chat_history::NewChatHistory;
use crate::models::message::ROLE_USER;
use crate::repositories::{chat_histories, conversations};
use crate::services::attachments::{prepare_prompt, UploadError};
use crate::services::conversation;
use crate::services::openrouter::{ChatMessage, ChatRelay, FileUpload, OpenRouterError, SendOptions};

pub const NO_RESPONSE: &str = "No response.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Relay(#[from] OpenRouterError),
    #[error("{0}")]
    Storage(String),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) | ChatError::Upload(_) => StatusCode::BAD_REQUEST,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Relay(err) => err.status(),
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContinueChatRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub file: Option<FileUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickChatRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChatResponse {
    pub conversation_id: i64,
    pub conversation_title: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueChatResponse {
    pub conversation_id: i64,
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickChatResponse {
    pub response: String,
}

fn require_model(model: &str) -> Result<String, ChatError> {
    let model = model.trim();
    if model.is_empty() {
        return Err(ChatError::Validation("Model is required".to_string()));
    }
    Ok(model.to_string())
}

fn require_prompt(prompt: &str, file: Option<&FileUpload>) -> Result<(), ChatError> {
    if prompt.trim().is_empty() && file.is_none() {
        return Err(ChatError::Validation("Prompt is required".to_string()));
    }
    Ok(())
}

/// Opens a conversation with the first prompt and relays it.
pub async fn start_chat<R: ChatRelay + ?Sized>(
    pool: &SqlitePool,
    relay: &R,
    req: StartChatRequest,
    max_file_size: u64,
) -> Result<StartChatResponse, ChatError> {
    info!(
        "[CHAT] start: has_file={}, prompt_length={}, model={}",
        req.file.is_some(),
        req.prompt.len(),
        req.model
    );
    let model = require_model(&req.model)?;
    require_prompt(&req.prompt, req.file.as_ref())?;

    let prepared = prepare_prompt(&req.prompt, req.file, max_file_size)?;

    let conversation = conversation::create_conversation(pool, &model, &prepared.prompt, req.title)
        .await
        .map_err(ChatError::Storage)?;

    let options = SendOptions {
        file: prepared.file,
        temperature: None,
    };
    let reply = relay
        .send_message(&model, vec![ChatMessage::new(ROLE_USER, prepared.prompt.clone())], options)
        .await
        .map_err(|err| {
            error!("[CHAT] start failed: conversation={}, error={}", conversation.id, err);
            err
        })?;

    chat_histories::create_chat_history(
        pool,
        &NewChatHistory {
            prompt: prepared.prompt,
            model: model.clone(),
            response: reply.content.clone(),
            title: Some(conversation.title.clone()),
            file_metadata: prepared.metadata,
            conversation_id: Some(conversation.id),
        },
    )
    .await
    .map_err(ChatError::Storage)?;

    conversation::add_assistant_message(pool, &conversation, &reply.content)
        .await
        .map_err(ChatError::Storage)?;

    Ok(StartChatResponse {
        conversation_id: conversation.id,
        conversation_title: conversation.title,
        response: reply.content,
    })
}

/// Appends a prompt to an existing conversation and relays the full context.
pub async fn continue_chat<R: ChatRelay + ?Sized>(
    pool: &SqlitePool,
    relay: &R,
    conversation_id: i64,
    req: ContinueChatRequest,
    max_file_size: u64,
) -> Result<ContinueChatResponse, ChatError> {
    let conversation = conversations::get_conversation_by_id(pool, conversation_id)
        .await
        .map_err(ChatError::Storage)?
        .ok_or(ChatError::NotFound("Conversation not found"))?;
    require_prompt(&req.prompt, req.file.as_ref())?;

    let prepared = prepare_prompt(&req.prompt, req.file, max_file_size)?;

    conversation::continue_conversation(pool, &conversation, &prepared.prompt)
        .await
        .map_err(ChatError::Storage)?;
    let context = conversation::get_conversation_context(pool, &conversation)
        .await
        .map_err(ChatError::Storage)?;

    info!(
        "[CHAT] continue: conversation={}, context_messages={}, has_file={}",
        conversation.id,
        context.len(),
        prepared.file.is_some()
    );

    let options = SendOptions {
        file: prepared.file,
        temperature: None,
    };
    let reply = relay
        .send_message(&conversation.model_id, context, options)
        .await
        .map_err(|err| {
            error!("[CHAT] continue failed: conversation={}, error={}", conversation.id, err);
            err
        })?;

    chat_histories::create_chat_history(
        pool,
        &NewChatHistory {
            prompt: prepared.prompt,
            model: conversation.model_id.clone(),
            response: reply.content.clone(),
            title: Some(conversation.title.clone()),
            file_metadata: prepared.metadata,
            conversation_id: Some(conversation.id),
        },
    )
    .await
    .map_err(ChatError::Storage)?;

    conversation::add_assistant_message(pool, &conversation, &reply.content)
        .await
        .map_err(ChatError::Storage)?;

    Ok(ContinueChatResponse {
        conversation_id: conversation.id,
        response: reply.content,
    })
}

/// Single-turn exchange recorded in history without a conversation.
///
/// An upstream error body or a reply without content is recorded and
/// answered as `No response.`; only missing credentials, transport and
/// decoding failures surface as errors.
pub async fn quick_chat<R: ChatRelay + ?Sized>(
    pool: &SqlitePool,
    relay: &R,
    req: QuickChatRequest,
) -> Result<QuickChatResponse, ChatError> {
    let model = require_model(&req.model)?;
    require_prompt(&req.prompt, None)?;

    let messages = vec![ChatMessage::new(ROLE_USER, req.prompt.clone())];
    let response = match relay.send_message(&model, messages, SendOptions::default()).await {
        Ok(reply) if !reply.content.is_empty() => reply.content,
        Ok(_) | Err(OpenRouterError::NoChoices) | Err(OpenRouterError::Api(_)) => {
            NO_RESPONSE.to_string()
        }
        Err(err) => return Err(err.into()),
    };

    chat_histories::create_chat_history(
        pool,
        &NewChatHistory {
            prompt: req.prompt,
            model,
            response: response.clone(),
            ..Default::default()
        },
    )
    .await
    .map_err(ChatError::Storage)?;

    Ok(QuickChatResponse { response })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::db::sqlite::open_in_memory;
    use crate::repositories::messages::list_messages_by_conversation;
    use crate::services::openrouter::types::RelayBoxFuture;
    use crate::services::openrouter::AssistantMessage;

    type Recorded = (String, Vec<ChatMessage>, Option<FileUpload>);

    struct FakeRelay {
        reply: Result<String, fn() -> OpenRouterError>,
        calls: Arc<Mutex<Vec<Recorded>>>,
    }

    impl FakeRelay {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing(err: fn() -> OpenRouterError) -> Self {
            Self {
                reply: Err(err),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ChatRelay for FakeRelay {
        fn send_message<'a>(
            &'a self,
            model_id: &'a str,
            messages: Vec<ChatMessage>,
            options: SendOptions,
        ) -> RelayBoxFuture<'a, Result<AssistantMessage, OpenRouterError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((model_id.to_string(), messages, options.file));
                match &self.reply {
                    Ok(content) => Ok(AssistantMessage {
                        role: "assistant".to_string(),
                        content: content.clone(),
                    }),
                    Err(make) => Err(make()),
                }
            })
        }
    }

    const MAX: u64 = 10 * 1024 * 1024;

    fn start(prompt: &str) -> StartChatRequest {
        StartChatRequest {
            model: "openai/gpt-4".to_string(),
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_chat_persists_conversation_and_history() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("Hi! How can I help?");

        let result = start_chat(&pool, &relay, start("Hello"), MAX).await.unwrap();
        assert_eq!(result.conversation_title, "Hello");
        assert_eq!(result.response, "Hi! How can I help?");

        let calls = relay.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "openai/gpt-4");
        assert_eq!(calls[0].1, vec![ChatMessage::new("user", "Hello")]);

        let messages = list_messages_by_conversation(&pool, result.conversation_id).await.unwrap();
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant"]);

        let history = chat_histories::list_chat_history(&pool, None, 0).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].conversation_id, Some(result.conversation_id));
        assert_eq!(history[0].title.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn continue_chat_relays_full_context() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("answer");
        let started = start_chat(&pool, &relay, start("first"), MAX).await.unwrap();

        let req = ContinueChatRequest {
            prompt: "second".to_string(),
            file: None,
        };
        let result = continue_chat(&pool, &relay, started.conversation_id, req, MAX)
            .await
            .unwrap();
        assert_eq!(result.conversation_id, started.conversation_id);

        let calls = relay.calls();
        assert_eq!(
            calls[1].1,
            vec![
                ChatMessage::new("user", "first"),
                ChatMessage::new("assistant", "answer"),
                ChatMessage::new("user", "second"),
            ]
        );

        let history = chat_histories::list_chat_history(&pool, None, 0).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn continue_unknown_conversation_is_not_found() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("x");
        let err = continue_chat(&pool, &relay, 99, ContinueChatRequest::default(), MAX)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Conversation not found");
        assert!(relay.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_uploads_before_persisting() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("x");
        let mut req = start("look at this");
        req.file = Some(FileUpload {
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            base64: "QUJD".to_string(),
        });

        let err = start_chat(&pool, &relay, req, MAX).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Unsupported file type: text/plain");
        assert!(conversations::list_conversations(&pool, None, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwards_images_and_stores_metadata() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("a cat");
        let mut req = start("what is this?");
        req.file = Some(FileUpload {
            name: "cat.png".to_string(),
            mime_type: "image/png".to_string(),
            base64: "iVBORw0KGgo=".to_string(),
        });

        start_chat(&pool, &relay, req, MAX).await.unwrap();
        assert_eq!(relay.calls()[0].2.as_ref().map(|f| f.name.as_str()), Some("cat.png"));

        let history = chat_histories::list_chat_history(&pool, None, 0).await.unwrap();
        let meta = history[0].file_metadata.as_ref().unwrap();
        assert_eq!(meta.mime_type, "image/png");
    }

    #[tokio::test]
    async fn maps_upstream_failures_to_statuses() {
        let pool = open_in_memory().await;

        let relay = FakeRelay::failing(|| OpenRouterError::Api("rate limited".to_string()));
        let err = start_chat(&pool, &relay, start("hi"), MAX).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "OpenRouter API Error: rate limited");

        let relay = FakeRelay::failing(|| OpenRouterError::MissingApiKey);
        let err = quick_chat(
            &pool,
            &relay,
            QuickChatRequest {
                prompt: "hi".to_string(),
                model: "m".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let relay = FakeRelay::failing(|| OpenRouterError::InvalidJson);
        let err = quick_chat(
            &pool,
            &relay,
            QuickChatRequest {
                prompt: "hi".to_string(),
                model: "m".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn validates_required_fields() {
        let pool = open_in_memory().await;
        let relay = FakeRelay::answering("x");

        let mut req = start("hi");
        req.model = " ".to_string();
        let err = start_chat(&pool, &relay, req, MAX).await.unwrap_err();
        assert_eq!(err.to_string(), "Model is required");

        let err = start_chat(&pool, &relay, start(""), MAX).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quick_chat_falls_back_when_reply_is_empty() {
        let pool = open_in_memory().await;
        let req = QuickChatRequest {
            prompt: "ping".to_string(),
            model: "openai/gpt-4".to_string(),
        };

        let relay = FakeRelay::failing(|| OpenRouterError::NoChoices);
        let result = quick_chat(&pool, &relay, req.clone()).await.unwrap();
        assert_eq!(result.response, NO_RESPONSE);

        let relay = FakeRelay::answering("");
        let result = quick_chat(&pool, &relay, req.clone()).await.unwrap();
        assert_eq!(result.response, NO_RESPONSE);

        let relay = FakeRelay::failing(|| OpenRouterError::Api("Invalid model".to_string()));
        let result = quick_chat(&pool, &relay, req.clone()).await.unwrap();
        assert_eq!(result.response, NO_RESPONSE);

        let relay = FakeRelay::answering("pong");
        let result = quick_chat(&pool, &relay, req).await.unwrap();
        assert_eq!(result.response, "pong");

        let history = chat_histories::list_chat_history(&pool, None, 0).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].response, "pong");
        assert!(history[1..].iter().all(|h| h.response == NO_RESPONSE));
        assert!(history.iter().all(|h| h.conversation_id.is_none()));
    }
}
