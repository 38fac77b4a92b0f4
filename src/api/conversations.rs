use axum::http::StatusCode;
use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::repositories::conversations;
use crate::services::conversation::get_conversation_context;

use super::{db_pool, error_response, ok_json, ApiResponse, PageQuery};

pub fn router() -> Router {
    Router::new()
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
}

async fn list_conversations(query: Result<Query<PageQuery>, QueryRejection>) -> ApiResponse {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let (limit, offset) = query.bounds();
    match conversations::list_conversations(&pool, limit, offset).await {
        Ok(list) => ok_json(list),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

async fn get_conversation(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    let conversation = match conversations::get_conversation_by_id(&pool, id).await {
        Ok(Some(conversation)) => conversation,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    };
    match get_conversation_context(&pool, &conversation).await {
        Ok(messages) => (
            StatusCode::OK,
            Json(json!({
                "id": conversation.id,
                "title": conversation.title,
                "modelId": conversation.model_id,
                "createdAt": conversation.created_at,
                "messages": messages
            })),
        ),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

async fn delete_conversation(Path(id): Path<i64>) -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match conversations::delete_conversation(&pool, id).await {
        Ok(true) => (StatusCode::OK, Json(json!({"success": true}))),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Conversation not found"),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
