use std::path::Path;
use std::time::Duration;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use super::types::SqliteConfig;

pub(super) async fn init_sqlite(cfg: &SqliteConfig) -> Result<SqlitePool, String> {
    let db_path = cfg
        .db_path
        .clone()
        .unwrap_or_else(|| "data/openrouter_chat.db".to_string());
    let path = Path::new(&db_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("create sqlite dir failed: {e}"))?;
        }
    }

    let mut options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    if let Some(timeout) = cfg.timeout {
        options = options.busy_timeout(Duration::from_millis(timeout));
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| format!("sqlite connect failed: {e}"))?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .ok();
    if let Some(busy) = cfg.busy_timeout {
        let _ = sqlx::query(&format!("PRAGMA busy_timeout = {}", busy))
            .execute(&pool)
            .await;
    }

    create_tables_sqlite(&pool).await?;

    info!("[SQLite] database initialized: {}", db_path);
    Ok(pool)
}

/// Single-connection in-memory database with the full schema, for tests.
#[cfg(test)]
pub async fn open_in_memory() -> SqlitePool {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("open in-memory sqlite");
    create_tables_sqlite(&pool).await.expect("create tables");
    pool
}

async fn create_tables_sqlite(pool: &SqlitePool) -> Result<(), String> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            model_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
        )"#,
        r#"CREATE TABLE IF NOT EXISTS chat_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt TEXT NOT NULL,
            model TEXT NOT NULL,
            response TEXT NOT NULL,
            title TEXT,
            file_metadata TEXT,
            conversation_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE SET NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS summaries (
            id TEXT PRIMARY KEY,
            chat_history_id INTEGER NOT NULL UNIQUE,
            summary_text TEXT NOT NULL,
            tokens_count INTEGER,
            type TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (chat_history_id) REFERENCES chat_history(id) ON DELETE CASCADE
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_chat_history_conversation ON chat_history(conversation_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_chat_history_title ON chat_history(title, created_at)",
    ];

    for stmt in statements {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| format!("create table failed: {e}"))?;
    }
    Ok(())
}
