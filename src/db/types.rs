use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub db_path: Option<String>,
    pub timeout: Option<u64>,
    pub busy_timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub sqlite: Option<SqliteConfig>,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: Some("data/openrouter_chat.db".to_string()),
            timeout: Some(30000),
            busy_timeout: Some(30000),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite: Some(SqliteConfig::default()),
        }
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
