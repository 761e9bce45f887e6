use std::sync::Arc;

mod core;
mod error_handler;
mod routes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::routes::{
    ask::ask_route::ask_route, health_route::health_route,
    upload_text::upload_text_route::upload_text_route,
};

pub use crate::core::app_state::{AppState, ConfigError, DEFAULT_API_ADDRESS, api_address};
pub use crate::error_handler::{AppError, AppResult};

/// Builds the HTTP router over shared state.
///
/// Request bodies are not size-limited: the reference document has no
/// maximum length.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/upload_text", post(upload_text_route))
        .route("/upload-text", post(upload_text_route))
        .route("/ask", post(ask_route))
        .route("/health", get(health_route))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Binds `address` and serves until Ctrl+C.
pub async fn start(state: AppState, address: &str) -> AppResult<()> {
    let app = router(Arc::new(state));

    // Bind to address
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{ScriptedLlm, state_with};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn upload_text_route_is_wired() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let app = router(state.clone());

        let body = json!({ "text": "The sky is blue." }).to_string();
        let (status, json) = send(app, post_json("/upload_text", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Text uploaded successfully");
        assert_eq!(json["textLength"], 16);
        assert_eq!(state.qa.store().get_document(), "The sky is blue.");
    }

    #[tokio::test]
    async fn hyphenated_alias_clears_document() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        state.qa.set_document(Some("old".into()));

        let (status, json) =
            send(router(state.clone()), post_json("/upload-text", "{}".into())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Text cleared successfully");
        assert_eq!(json["textLength"], 0);
        assert_eq!(state.qa.store().get_document(), "");
    }

    #[tokio::test]
    async fn upload_larger_than_default_body_limit_is_stored() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let len = 3 * 1024 * 1024;
        let body = json!({ "text": "a".repeat(len) }).to_string();

        let (status, json) = send(router(state.clone()), post_json("/upload_text", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["textLength"], len);
        assert_eq!(state.qa.store().get_document().len(), len);
    }

    #[tokio::test]
    async fn invalid_json_through_router_is_bad_request() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let (status, json) =
            send(router(state), post_json("/upload_text", "{not json".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn ask_route_is_wired() {
        let state = state_with(ScriptedLlm::replying(vec!["Blue"]));
        state.qa.set_document(Some("The sky is blue.".into()));

        let body = json!({ "question": "What color is the sky?" }).to_string();
        let (status, json) = send(router(state), post_json("/ask", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], "Blue");
    }

    #[tokio::test]
    async fn ask_without_document_through_router() {
        let state = state_with(ScriptedLlm::replying(vec!["x"]));
        let body = json!({ "question": "q?" }).to_string();
        let (status, json) = send(router(state), post_json("/ask", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "NO_DOCUMENT");
    }

    #[tokio::test]
    async fn health_route_is_wired() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(router(state), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], false);
        assert_eq!(json["documentLoaded"], false);
    }
}
