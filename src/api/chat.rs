use axum::{
    extract::{rejection::JsonRejection, Path},
    routing::post,
    Json, Router,
};

use crate::config::Config;
use crate::services::chat::{
    continue_chat, quick_chat, start_chat, ChatError, ContinueChatRequest, QuickChatRequest,
    StartChatRequest,
};

use super::{db_pool, error_response, ok_json, require_openrouter_client, ApiResponse};

pub fn router() -> Router {
    Router::new()
        .route("/api/chat", post(quick))
        .route("/chat/start", post(start))
        .route("/chat/continue/{conversation_id}", post(continue_conversation))
}

fn chat_error(err: ChatError) -> ApiResponse {
    error_response(err.status(), err.to_string())
}

fn body_rejected(rejection: JsonRejection) -> ApiResponse {
    error_response(rejection.status(), rejection.body_text())
}

async fn quick(body: Result<Json<QuickChatRequest>, JsonRejection>) -> ApiResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    let client = match require_openrouter_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match quick_chat(&pool, &client, req).await {
        Ok(out) => ok_json(out),
        Err(err) => chat_error(err),
    }
}

async fn start(body: Result<Json<StartChatRequest>, JsonRejection>) -> ApiResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    let client = match require_openrouter_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match start_chat(&pool, &client, req, Config::get().max_file_size_bytes).await {
        Ok(out) => ok_json(out),
        Err(err) => chat_error(err),
    }
}

async fn continue_conversation(
    Path(conversation_id): Path<i64>,
    body: Result<Json<ContinueChatRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return body_rejected(rejection),
    };
    let client = match require_openrouter_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match continue_chat(&pool, &client, conversation_id, req, Config::get().max_file_size_bytes).await {
        Ok(out) => ok_json(out),
        Err(err) => chat_error(err),
    }
}
