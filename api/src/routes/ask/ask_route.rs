//! POST /ask: answers a question from the uploaded document only.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::{info, instrument, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"What color is the sky?"}'
/// ```
#[instrument(name = "ask_route", skip_all)]
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AskResponse>> {
    let Json(body) = payload.map_err(|rej| {
        warn!(reason = %rej.body_text(), "ask rejected: invalid body");
        AppError::from(rej)
    })?;

    let answer = state.qa.ask(body.question.as_deref()).await?;
    info!(
        answer_len = answer.len(),
        refused = answer == state.qa.refusal(),
        "question answered"
    );

    Ok(Json(AskResponse { answer }))
}
