use axum::http::StatusCode;
use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::config::Config;
use crate::repositories::chat_histories;
use crate::services::openrouter::OpenRouterClient;
use crate::services::summary::engine;
use crate::services::summary::{SummaryError, SummaryPolicy};

use super::{db_pool, error_response, ok_json, openrouter_client, ApiResponse, PageQuery};

#[derive(Debug, Deserialize)]
struct ResumeQuery {
    context: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/chat-history", get(list_history))
        .route("/api/chat-history/{id}", get(get_history))
        .route(
            "/api/chat-history/{id}/conversation-thread",
            get(get_conversation_thread),
        )
        .route("/api/chat-history/{id}/resume-info", get(get_resume_info))
        .route("/api/chat-history/{id}/create-summary", post(create_summary))
        .route("/api/chat-history/{id}/summary", get(get_summary))
        .route("/api/chat-history/{id}/resume-prompt", get(get_resume_prompt))
}

fn summary_error(err: SummaryError) -> ApiResponse {
    error_response(err.status(), err.to_string())
}

fn optional_client() -> Result<Option<OpenRouterClient>, ApiResponse> {
    openrouter_client().map_err(|err| error_response(err.status(), err.to_string()))
}

async fn list_history(query: Result<Query<PageQuery>, QueryRejection>) -> ApiResponse {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let (limit, offset) = query.bounds();
    match chat_histories::list_chat_history(&pool, limit, offset).await {
        Ok(list) => ok_json(list),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

async fn get_history(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match chat_histories::get_chat_history_by_id(&pool, id).await {
        Ok(Some(entry)) => ok_json(entry),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Chat history not found"),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

async fn get_conversation_thread(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match engine::conversation_thread(&pool, id).await {
        Ok(thread) => ok_json(thread),
        Err(err) => summary_error(err),
    }
}

async fn get_resume_info(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let client = match optional_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    let policy = SummaryPolicy::from_config(Config::get());
    match engine::resume_info(&pool, id, client.as_ref(), &policy).await {
        Ok(info) => ok_json(info),
        Err(err) => summary_error(err),
    }
}

async fn create_summary(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let client = match optional_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    let policy = SummaryPolicy::from_config(Config::get());
    match engine::create_summary(&pool, id, client.as_ref(), &policy).await {
        Ok(created) => ok_json(created),
        Err(err) => summary_error(err),
    }
}

async fn get_summary(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let client = match optional_client() {
        Ok(client) => client,
        Err(resp) => return resp,
    };
    match engine::get_summary(&pool, id, client.as_ref()).await {
        Ok(summary) => ok_json(summary),
        Err(err) => summary_error(err),
    }
}

async fn get_resume_prompt(Path(id): Path<i64>, Query(query): Query<ResumeQuery>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match engine::resume_prompt(&pool, id, query.context.as_deref()).await {
        Ok(prompt) => ok_json(prompt),
        Err(err) => summary_error(err),
    }
}
