//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`.
//! Middleware: CORS, tracing.
//!
//! Static assets are served from `server.web_dir` when that directory exists.
//! API routes take priority; unknown paths fall through to its `index.html`.
//! Otherwise only the API is served.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/reset", post(handlers::conversation::reset))
        .route("/history", post(handlers::conversation::history))
        .route("/narrate", post(handlers::conversation::narrate))
        .route("/scenarios", get(handlers::scenario::list_scenarios));

    let web_dir = state.config.server.web_dir.clone();

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if std::path::Path::new(&web_dir).is_dir() {
        let index_path = format!("{web_dir}/index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "static file serving enabled");
    }

    router
}

/// GET /health - liveness plus store counts.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.gateway.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "conversations": stats.conversations,
                "messages": stats.messages,
            })),
        ),
        Err(e) => {
            tracing::warn!("health check could not read store: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(serde_json::json!({
                    "status": "degraded",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use gumshoe_types::config::GlobalConfig;
    use gumshoe_types::llm::ProviderType;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    async fn test_app() -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        let mut config = GlobalConfig::default();
        config.backend.provider = ProviderType::Echo;
        config.server.web_dir = tmp.path().join("no-such-dir").display().to_string();

        let state = AppState::build(tmp.path().to_path_buf(), config, true)
            .await
            .unwrap();
        (tmp, state)
    }

    async fn post_json(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_history_reset_flow() {
        let (_tmp, state) = test_app().await;

        let (status, body) = post_json(
            &state,
            "/api/chat",
            json!({"conversation_key": "case-1", "text": "  Who took the diamond?  "}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["conversation_key"], "case-1");
        assert_eq!(body["data"]["sequence"], 2);
        assert_eq!(body["data"]["scenario"], "freeform");
        assert!(
            body["data"]["assistant_text"]
                .as_str()
                .unwrap()
                .contains("Who took the diamond?")
        );

        let (status, body) =
            post_json(&state, "/api/history", json!({"conversation_key": "case-1"})).await;
        assert_eq!(status, StatusCode::OK);
        let log = body["data"].as_array().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0]["role"], "user");
        assert_eq!(log[0]["content"], "Who took the diamond?");
        assert_eq!(log[0]["sequence"], 1);
        assert_eq!(log[1]["role"], "assistant");

        let (status, body) =
            post_json(&state, "/api/reset", json!({"conversation_key": "case-1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["success"], true);

        let (_, body) =
            post_json(&state, "/api/history", json!({"conversation_key": "case-1"})).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_accepts_legacy_field_names() {
        let (_tmp, state) = test_app().await;

        let (status, body) = post_json(
            &state,
            "/api/chat",
            json!({"conversationId": "conv_1", "message": "Talk.", "mystery": "heist"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["conversation_key"], "conv_1");
        assert_eq!(body["data"]["scenario"], "heist");
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let (_tmp, state) = test_app().await;

        let (status, body) = post_json(
            &state,
            "/api/chat",
            json!({"conversation_key": "case-2", "text": "   "}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "INVALID_INPUT");
        assert!(body["data"].is_null());

        let (_, body) =
            post_json(&state, "/api/history", json!({"conversation_key": "case-2"})).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (_tmp, state) = test_app().await;

        let (status, body) = post_json(&state, "/api/reset", json!({"wrong": 1})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_narrate_then_chat() {
        let (_tmp, state) = test_app().await;

        let (status, body) = post_json(
            &state,
            "/api/narrate",
            json!({"conversation_key": "case-3", "text": "A shot rings out."}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "narration");
        assert_eq!(body["data"]["sequence"], 1);

        let (_, body) = post_json(
            &state,
            "/api/chat",
            json!({"conversation_key": "case-3", "text": "Get down!"}),
        )
        .await;
        assert_eq!(body["data"]["sequence"], 3);
    }

    #[tokio::test]
    async fn test_scenarios_and_health() {
        let (_tmp, state) = test_app().await;

        let request = Request::get("/api/scenarios").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        let listing = body["data"].as_array().unwrap();
        assert_eq!(listing.len(), 6);
        assert!(listing.iter().any(|s| s["id"] == "heist"));

        post_json(
            &state,
            "/api/chat",
            json!({"conversation_key": "case-4", "text": "Evening."}),
        )
        .await;

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["conversations"], 1);
        assert_eq!(body["messages"], 2);
    }
}
