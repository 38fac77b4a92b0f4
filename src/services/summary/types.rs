use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::services::openrouter::OpenRouterError;

#[derive(Debug, Clone)]
pub struct SummaryPolicy {
    pub temperature: f64,
    pub recommend_messages: i64,
    pub recommend_tokens: i64,
}

impl SummaryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            temperature: cfg.summary_temperature,
            recommend_messages: cfg.summary_recommend_messages,
            recommend_tokens: cfg.summary_recommend_tokens,
        }
    }
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Current message not found in thread")]
    NotInThread,
    #[error("Invalid context type: {0}")]
    InvalidContext(String),
    #[error(transparent)]
    Relay(#[from] OpenRouterError),
    #[error("{0}")]
    Storage(String),
}

impl SummaryError {
    pub fn status(&self) -> StatusCode {
        match self {
            SummaryError::NotFound(_) => StatusCode::NOT_FOUND,
            SummaryError::InvalidContext(_) => StatusCode::BAD_REQUEST,
            SummaryError::Relay(err) => err.status(),
            SummaryError::NotInThread | SummaryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenEstimates {
    pub complete: i64,
    pub summary: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimates {
    pub complete: f64,
    pub summary: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInfo {
    pub id: i64,
    pub title: Option<String>,
    pub model: String,
    pub message_count: usize,
    pub context_length: usize,
    pub token_estimates: TokenEstimates,
    pub costs: CostEstimates,
    pub has_summary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_estimated: Option<bool>,
    pub summary_recommended: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSummary {
    pub success: bool,
    pub summary: String,
    pub tokens_count: i64,
    pub cost: f64,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSummary {
    pub id: String,
    pub summary: String,
    pub tokens_count: i64,
    pub cost: f64,
    #[serde(rename = "type")]
    pub summary_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryListItem {
    pub id: String,
    pub chat_history_id: i64,
    #[serde(rename = "type")]
    pub summary_type: Option<String>,
    pub tokens_count: Option<i64>,
    pub created_at: String,
    pub summary_text_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryList {
    pub count: usize,
    pub summaries: Vec<SummaryListItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEntry {
    pub id: i64,
    pub prompt: String,
    pub response: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    pub title: Option<String>,
    pub model: String,
    pub current_message_index: i64,
    pub messages: Vec<ThreadEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeContext {
    Complete,
    Summary,
}

impl ResumeContext {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("complete") => Some(ResumeContext::Complete),
            Some("summary") => Some(ResumeContext::Summary),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResumeContext::Complete => "complete",
            ResumeContext::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumePrompt {
    pub context: &'static str,
    pub prompt: String,
}
