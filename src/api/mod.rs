use axum::body::Body;
use axum::extract::{DefaultBodyLimit, OriginalUri};
use axum::http::{
    header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    Request, StatusCode,
};
use axum::response::IntoResponse;
use axum::response::Response;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::config::Config;
use crate::repositories::db::get_db;
use crate::services::openrouter::{OpenRouterClient, OpenRouterError};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);
static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

pub mod chat;
pub mod chat_history;
pub mod conversations;
pub mod models;
pub mod summaries;

pub(crate) type ApiResponse = (StatusCode, Json<Value>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiResponse {
    (status, Json(json!({"error": message.into()})))
}

pub(crate) fn ok_json<T: serde::Serialize>(value: T) -> ApiResponse {
    (
        StatusCode::OK,
        Json(serde_json::to_value(value).unwrap_or(Value::Null)),
    )
}

/// `limit`/`offset` of the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    /// A non-positive limit lists everything; negative offsets start at zero.
    pub(crate) fn bounds(&self) -> (Option<i64>, i64) {
        let limit = self.limit.filter(|l| *l > 0);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

pub(crate) async fn db_pool() -> Result<SqlitePool, ApiResponse> {
    get_db()
        .await
        .map(|db| db.pool().clone())
        .map_err(|err| error_response(StatusCode::INTERNAL_SERVER_ERROR, err))
}

/// Upstream client, or `None` when no API key is configured.
pub(crate) fn openrouter_client() -> Result<Option<OpenRouterClient>, OpenRouterError> {
    match OpenRouterClient::from_config(Config::get()) {
        Ok(client) => Ok(Some(client)),
        Err(OpenRouterError::MissingApiKey) => Ok(None),
        Err(err) => Err(err),
    }
}

pub(crate) fn require_openrouter_client() -> Result<OpenRouterClient, ApiResponse> {
    OpenRouterClient::from_config(Config::get()).map_err(|err| error_response(err.status(), err.to_string()))
}

pub fn router() -> Router {
    let cfg = Config::get();

    let allowed_headers = [
        ACCEPT,
        AUTHORIZATION,
        CONTENT_TYPE,
        ORIGIN,
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("x-request-id"),
    ];

    let cors = if cfg.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(allowed_headers)
            .allow_methods(Any)
            .allow_credentials(false)
    } else {
        let origins = cfg
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(allowed_headers)
            .allow_methods(Any)
            .allow_credentials(true)
    };

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let request_id = header_value(req, &REQUEST_ID_HEADER);
            info_span!(
                "http.request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
                request_id = %request_id
            )
        })
        .on_request(|_req: &Request<Body>, _span: &tracing::Span| {
            info!("request.start");
        })
        .on_response(
            |res: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                info!(status = %res.status(), latency_ms = %latency.as_millis(), "request.end");
            },
        )
        .on_failure(|err, latency: std::time::Duration, _span: &tracing::Span| {
            tracing::error!(error = %err, latency_ms = %latency.as_millis(), "request.failure");
        });

    Router::new()
        .merge(models::router())
        .merge(chat::router())
        .merge(conversations::router())
        .merge(chat_history::router())
        .merge(summaries::router())
        .route("/health", axum::routing::get(health))
        .route("/", axum::routing::get(root))
        .fallback(fallback_404)
        .layer(cors)
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER.clone()))
        .layer(SetRequestIdLayer::new(
            REQUEST_ID_HEADER.clone(),
            MakeRequestUuid,
        ))
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": START_TIME.elapsed().as_secs_f64()
    }))
}

async fn root() -> axum::Json<serde_json::Value> {
    let cfg = Config::get();
    axum::Json(serde_json::json!({
        "name": cfg.app_title,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat relay for the OpenRouter API with conversation history and summaries",
        "endpoints": {
            "health": "/health",
            "models": "/api/models",
            "chat": "/api/chat",
            "conversations": "/api/conversations",
            "chatHistory": "/api/chat-history",
            "summaries": "/api/summaries"
        }
    }))
}

async fn fallback_404(uri: OriginalUri) -> impl IntoResponse {
    let path = uri.0.path().to_string();
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "message": "Resource not found",
                "path": path
            }
        })),
    )
}

fn header_value(req: &Request<Body>, name: &HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_ok() {
        let res = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let res = router()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["path"], "/nope");
    }

    #[tokio::test]
    async fn relay_routes_need_api_key() {
        let res = router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/chat")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"prompt":"hi","model":"openai/gpt-4"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Missing API key.");
    }

    #[tokio::test]
    async fn malformed_chat_body_is_json_error() {
        let res = router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/chat/start")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"model\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn non_numeric_limit_is_rejected() {
        let res = router()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations?limit=12abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[test]
    fn page_bounds_clamp_limit_and_offset() {
        let page = PageQuery {
            limit: Some(20),
            offset: Some(-5),
        };
        assert_eq!(page.bounds(), (Some(20), 0));

        let unlimited = PageQuery {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(unlimited.bounds(), (None, 40));
        assert_eq!(PageQuery::default().bounds(), (None, 0));
    }
}
