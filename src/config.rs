use once_cell::sync::OnceCell;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_APP_TITLE: &str = "OpenRouter Chat App";

#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub app_url: String,
    pub app_title: String,
    pub upstream_timeout_secs: u64,
    pub port: u16,
    pub app_env: String,
    pub host: String,
    pub log_level: String,
    pub log_max_files: String,
    pub cors_origins: Vec<String>,
    pub max_file_size_bytes: u64,
    pub summary_temperature: f64,
    pub summary_recommend_messages: i64,
    pub summary_recommend_tokens: i64,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: String::new(),
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            app_url: "https://localhost".to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            upstream_timeout_secs: 120,
            port: 8000,
            app_env: "development".to_string(),
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            log_max_files: "7d".to_string(),
            cors_origins: vec!["*".to_string()],
            max_file_size_bytes: 10 * 1024 * 1024,
            summary_temperature: 0.3,
            summary_recommend_messages: 10,
            summary_recommend_tokens: 4000,
        }
    }
}

impl Config {
    pub fn init_global() -> Result<&'static Config, String> {
        let cfg = Config::from_env()?;
        CONFIG
            .set(cfg)
            .map_err(|_| "Config already initialized".to_string())?;
        CONFIG.get().ok_or_else(|| "Config not initialized".to_string())
    }

    /// Returns the global config, falling back to defaults when `init_global`
    /// has not run (unit tests).
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::default)
    }

    fn from_env() -> Result<Config, String> {
        let defaults = Config::default();
        let read_int = |key: &str, def: i64| -> i64 {
            match std::env::var(key) {
                Ok(v) => v.trim().parse::<i64>().unwrap_or(def),
                Err(_) => def,
            }
        };
        let read_num = |key: &str, def: f64| -> f64 {
            match std::env::var(key) {
                Ok(v) => v.trim().parse::<f64>().unwrap_or(def),
                Err(_) => def,
            }
        };
        let read_str = |key: &str, def: &str| -> String {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| def.to_string())
        };

        let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
            .unwrap_or_default()
            .trim()
            .to_string();
        let openrouter_base_url = read_str("OPENROUTER_BASE_URL", &defaults.openrouter_base_url);
        if !openrouter_base_url.starts_with("http://") && !openrouter_base_url.starts_with("https://") {
            return Err(format!("OPENROUTER_BASE_URL must be an http(s) url, got {openrouter_base_url}"));
        }
        let app_url = read_str("APP_URL", &defaults.app_url);
        let app_title = read_str("APP_TITLE", &defaults.app_title);
        let upstream_timeout_secs = read_int("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout_secs as i64).max(1) as u64;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let app_env = read_str("APP_ENV", &defaults.app_env);
        let host = read_str("HOST", &defaults.host);

        let log_level = read_str("LOG_LEVEL", &defaults.log_level);
        let log_max_files = read_str("LOG_MAX_FILES", &defaults.log_max_files);

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.cors_origins.clone(),
        };

        let max_file_size_bytes = read_int("MAX_FILE_SIZE_BYTES", defaults.max_file_size_bytes as i64).max(1) as u64;
        let summary_temperature = read_num("SUMMARY_TEMPERATURE", defaults.summary_temperature);
        let summary_recommend_messages = read_int("SUMMARY_RECOMMEND_MESSAGES", defaults.summary_recommend_messages);
        let summary_recommend_tokens = read_int("SUMMARY_RECOMMEND_TOKENS", defaults.summary_recommend_tokens);

        Ok(Config {
            openrouter_api_key,
            openrouter_base_url,
            app_url,
            app_title,
            upstream_timeout_secs,
            port,
            app_env,
            host,
            log_level,
            log_max_files,
            cors_origins,
            max_file_size_bytes,
            summary_temperature,
            summary_recommend_messages,
            summary_recommend_tokens,
        })
    }

    pub fn print(&self) {
        println!("Current configuration:");
        println!("  - APP_ENV: {}", self.app_env);
        println!("  - PORT: {}", self.port);
        println!("  - HOST: {}", self.host);
        println!("  - OPENROUTER_BASE_URL: {}", self.openrouter_base_url);
        println!(
            "  - OPENROUTER_API_KEY: {}",
            if self.openrouter_api_key.is_empty() { "not set" } else { "set" }
        );
        println!("  - APP_URL: {}", self.app_url);
        println!("  - UPSTREAM_TIMEOUT_SECS: {}", self.upstream_timeout_secs);
        println!("  - LOG_LEVEL: {}", self.log_level);
        println!("  - MAX_FILE_SIZE_BYTES: {}", self.max_file_size_bytes);
        println!("  - Summary:");
        println!("    • SUMMARY_TEMPERATURE: {}", self.summary_temperature);
        println!("    • SUMMARY_RECOMMEND_MESSAGES: {}", self.summary_recommend_messages);
        println!("    • SUMMARY_RECOMMEND_TOKENS: {}", self.summary_recommend_tokens);
    }
}
