use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde_json::json;

use crate::services::openrouter::catalog::list_models;

use super::{error_response, require_openrouter_client, ApiResponse};

pub fn router() -> Router {
    Router::new().route("/api/models", get(get_models))
}

async fn get_models() -> ApiResponse {
    let client = match require_openrouter_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    match list_models(&client).await {
        Ok(models) => (StatusCode::OK, Json(json!({"models": models}))),
        Err(err) => error_response(StatusCode::BAD_GATEWAY, err),
    }
}
