use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name and MIME type of the file uploaded alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub id: i64,
    pub prompt: String,
    pub model: String,
    pub response: String,
    pub title: Option<String>,
    pub file_metadata: Option<FileMetadata>,
    pub conversation_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, FromRow)]
pub struct ChatHistoryRow {
    pub id: i64,
    pub prompt: String,
    pub model: String,
    pub response: String,
    pub title: Option<String>,
    pub file_metadata: Option<String>,
    pub conversation_id: Option<i64>,
    pub created_at: String,
}

impl ChatHistoryRow {
    pub fn to_entry(self) -> ChatHistory {
        ChatHistory {
            id: self.id,
            prompt: self.prompt,
            model: self.model,
            response: self.response,
            title: self.title,
            file_metadata: self
                .file_metadata
                .and_then(|raw| serde_json::from_str::<FileMetadata>(&raw).ok()),
            conversation_id: self.conversation_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewChatHistory {
    pub prompt: String,
    pub model: String,
    pub response: String,
    pub title: Option<String>,
    pub file_metadata: Option<FileMetadata>,
    pub conversation_id: Option<i64>,
}
