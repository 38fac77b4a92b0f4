use axum::{routing::get, Router};

use crate::services::summary::engine::list_summaries;

use super::{db_pool, error_response, ok_json, ApiResponse};

pub fn router() -> Router {
    Router::new().route("/api/summaries", get(get_summaries))
}

async fn get_summaries() -> ApiResponse {
    let pool = match db_pool().await {
        Ok(pool) => pool,
        Err(resp) => return resp,
    };
    match list_summaries(&pool).await {
        Ok(list) => ok_json(list),
        Err(err) => error_response(err.status(), err.to_string()),
    }
}
