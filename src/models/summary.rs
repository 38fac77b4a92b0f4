use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::time::now_rfc3339;

pub const SUMMARY_TYPE_INTELLIGENT: &str = "intelligent";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Summary {
    pub id: String,
    pub chat_history_id: i64,
    pub summary_text: String,
    pub tokens_count: Option<i64>,
    #[sqlx(rename = "type")]
    pub summary_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Summary {
    pub fn new(chat_history_id: i64, summary_text: String, tokens_count: i64, summary_type: &str) -> Summary {
        let now = now_rfc3339();
        Summary {
            id: Uuid::new_v4().to_string(),
            chat_history_id,
            summary_text,
            tokens_count: Some(tokens_count),
            summary_type: Some(summary_type.to_string()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
