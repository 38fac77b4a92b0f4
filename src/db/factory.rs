use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::Mutex;
use tracing::warn;

use super::sqlite::init_sqlite;
use super::types::{Database, DatabaseConfig};

const DEFAULT_CONFIG_PATH: &str = "config/database.json";

static DB_FACTORY: OnceCell<Arc<DatabaseFactory>> = OnceCell::new();

pub struct DatabaseFactory {
    adapter: Mutex<Option<Arc<Database>>>,
}

impl DatabaseFactory {
    pub fn new() -> Self {
        Self {
            adapter: Mutex::new(None),
        }
    }

    pub async fn get_adapter(&self) -> Result<Arc<Database>, String> {
        let mut slot = self.adapter.lock().await;
        if let Some(adapter) = slot.clone() {
            return Ok(adapter);
        }

        let config = load_config(Path::new(DEFAULT_CONFIG_PATH))?;
        let sqlite_cfg = config.sqlite.unwrap_or_default();
        let pool = init_sqlite(&sqlite_cfg).await?;
        let adapter = Arc::new(Database::new(pool));
        *slot = Some(adapter.clone());
        Ok(adapter)
    }
}

pub fn load_config(path: &Path) -> Result<DatabaseConfig, String> {
    let cfg = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("read config failed: {e}"))?;
        parse_config(&raw)?
    } else {
        warn!("[DatabaseFactory] config not found at {:?}, using default", path);
        DatabaseConfig::default()
    };

    Ok(apply_env_overrides(cfg, std::env::var("SQLITE_DB_PATH").ok()))
}

fn parse_config(raw: &str) -> Result<DatabaseConfig, String> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        warn!("[DatabaseFactory] config empty, using default");
        return Ok(DatabaseConfig::default());
    }
    serde_json::from_str::<DatabaseConfig>(trimmed).map_err(|e| format!("parse config failed: {e}"))
}

fn apply_env_overrides(mut cfg: DatabaseConfig, db_path_env: Option<String>) -> DatabaseConfig {
    if let Some(path) = db_path_env.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        let mut sqlite = cfg.sqlite.clone().unwrap_or_default();
        sqlite.db_path = Some(PathBuf::from(path).to_string_lossy().to_string());
        cfg.sqlite = Some(sqlite);
    }
    cfg
}

pub async fn init_global() -> Result<Arc<Database>, String> {
    let factory = Arc::new(DatabaseFactory::new());
    DB_FACTORY
        .set(factory.clone())
        .map_err(|_| "DB factory already initialized".to_string())?;
    factory.get_adapter().await
}

pub async fn get_db() -> Result<Arc<Database>, String> {
    let factory = DB_FACTORY
        .get()
        .ok_or_else(|| "DB factory not initialized".to_string())?;
    factory.get_adapter().await
}
