use std::time::Duration;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::config::Config;
use crate::utils::log_helpers::{log_relay_error, log_relay_request, log_relay_response, truncate_log};

use super::error::OpenRouterError;
use super::payload::{build_request_body, parse_completion};
use super::types::{AssistantMessage, ChatMessage, ChatRelay, ModelSource, RelayBoxFuture, SendOptions};

static HTTP_CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

fn shared_http_client(timeout_secs: u64) -> Result<reqwest::Client, OpenRouterError> {
    let client = HTTP_CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
    })?;
    Ok(client.clone())
}

/// Bearer-authenticated client for the OpenRouter REST API.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_url: String,
    app_title: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: String,
        base_url: String,
        app_url: String,
        app_title: String,
        timeout_secs: u64,
    ) -> Result<Self, OpenRouterError> {
        if api_key.trim().is_empty() {
            return Err(OpenRouterError::MissingApiKey);
        }
        Ok(Self {
            http: shared_http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            app_url,
            app_title,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, OpenRouterError> {
        Self::new(
            cfg.openrouter_api_key.clone(),
            cfg.openrouter_base_url.clone(),
            cfg.app_url.clone(),
            cfg.app_title.clone(),
            cfg.upstream_timeout_secs,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_completion(
        &self,
        model_id: &str,
        messages: Vec<ChatMessage>,
        options: SendOptions,
    ) -> Result<AssistantMessage, OpenRouterError> {
        let file_type = options
            .file
            .as_ref()
            .map(|f| f.mime_type.as_str())
            .unwrap_or("none");
        log_relay_request(model_id, options.file.is_some(), file_type, messages.len());

        let body = build_request_body(model_id, &messages, &options)?;
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let raw = resp.text().await?;
        log_relay_response(status, &raw);

        parse_completion(status, &raw)
    }

    async fn get_models(&self) -> Result<Vec<Value>, OpenRouterError> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(OpenRouterError::Api(format!(
                "status {}: {}",
                status.as_u16(),
                truncate_log(&raw, 500)
            )));
        }

        let val: Value = serde_json::from_str(&raw).map_err(|_| OpenRouterError::InvalidJson)?;
        Ok(val
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default())
    }
}

impl ChatRelay for OpenRouterClient {
    fn send_message<'a>(
        &'a self,
        model_id: &'a str,
        messages: Vec<ChatMessage>,
        options: SendOptions,
    ) -> RelayBoxFuture<'a, Result<AssistantMessage, OpenRouterError>> {
        Box::pin(async move {
            let result = self.post_completion(model_id, messages, options).await;
            if let Err(err) = &result {
                log_relay_error(model_id, &err.to_string());
            }
            result
        })
    }
}

impl ModelSource for OpenRouterClient {
    fn fetch_models<'a>(&'a self) -> RelayBoxFuture<'a, Result<Vec<Value>, OpenRouterError>> {
        Box::pin(async move {
            let result = self.get_models().await;
            if let Err(err) = &result {
                log_relay_error("models", &err.to_string());
            }
            result
        })
    }
}
