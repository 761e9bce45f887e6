//! POST /upload_text: replaces or clears the reference document.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::{info, instrument, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::upload_text::upload_text_request::{UploadTextRequest, UploadTextResponse},
};

/// Handler: POST /upload_text (also mounted as /upload-text)
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/upload_text \
///   -H 'content-type: application/json' \
///   -d '{"text":"The sky is blue."}'
/// ```
#[instrument(name = "upload_text_route", skip_all)]
pub async fn upload_text_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadTextRequest>, JsonRejection>,
) -> AppResult<Json<UploadTextResponse>> {
    let Json(body) = payload.map_err(|rej| {
        warn!(reason = %rej.body_text(), "upload rejected: invalid body");
        AppError::from(rej)
    })?;

    let update = state.qa.set_document(body.text);
    let message = if update.cleared {
        "Text cleared successfully"
    } else {
        "Text uploaded successfully"
    };
    info!(text_length = update.text_length, "{message}");

    Ok(Json(UploadTextResponse {
        message: message.to_string(),
        text_length: update.text_length,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{ScriptedLlm, state_with};
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };

    fn request(text: Option<&str>) -> Result<Json<UploadTextRequest>, JsonRejection> {
        Ok(Json(UploadTextRequest {
            text: text.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn upload_stores_text_and_reports_length() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let Json(resp) = upload_text_route(State(state.clone()), request(Some("The sky is blue.")))
            .await
            .unwrap();

        assert_eq!(resp.message, "Text uploaded successfully");
        assert_eq!(resp.text_length, 16);
        assert_eq!(state.qa.store().get_document(), "The sky is blue.");
    }

    #[tokio::test]
    async fn empty_or_missing_text_clears() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        let Json(first) = upload_text_route(State(state.clone()), request(Some("old")))
            .await
            .unwrap();
        assert_eq!(first.text_length, 3);

        for text in [Some(""), None] {
            let Json(resp) = upload_text_route(State(state.clone()), request(text))
                .await
                .unwrap();
            assert_eq!(resp.message, "Text cleared successfully");
            assert_eq!(resp.text_length, 0);
            assert_eq!(state.qa.store().get_document(), "");
        }
    }

    #[tokio::test]
    async fn response_uses_camel_case_length() {
        let resp = UploadTextResponse {
            message: "Text uploaded successfully".into(),
            text_length: 3,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["textLength"], 3);
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request_and_keeps_document() {
        let state = state_with(ScriptedLlm::replying(vec![]));
        state.qa.set_document(Some("kept".into()));

        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": 42}"#))
            .unwrap();
        let rejection = Json::<UploadTextRequest>::from_request(req, &()).await;
        assert!(rejection.is_err());

        let err = upload_text_route(State(state.clone()), rejection)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.qa.store().get_document(), "kept");
    }
}
