use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::OpenRouterError;

pub type RelayBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// A file sent inline with a prompt, as the browser uploads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub base64: String,
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub file: Option<FileUpload>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completion side of the upstream API.
pub trait ChatRelay: Send + Sync {
    fn send_message<'a>(
        &'a self,
        model_id: &'a str,
        messages: Vec<ChatMessage>,
        options: SendOptions,
    ) -> RelayBoxFuture<'a, Result<AssistantMessage, OpenRouterError>>;
}

/// Raw `data[]` entries of the upstream model listing.
pub trait ModelSource: Send + Sync {
    fn fetch_models<'a>(&'a self) -> RelayBoxFuture<'a, Result<Vec<Value>, OpenRouterError>>;
}
