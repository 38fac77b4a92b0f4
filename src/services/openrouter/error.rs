use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("Missing API key.")]
    MissingApiKey,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("OpenRouter API Error: {0}")]
    Api(String),
    #[error("Invalid JSON response from OpenRouter")]
    InvalidJson,
    #[error("No valid response from OpenRouter")]
    NoChoices,
    #[error("OpenRouter request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl OpenRouterError {
    pub fn status(&self) -> StatusCode {
        match self {
            OpenRouterError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            OpenRouterError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}
