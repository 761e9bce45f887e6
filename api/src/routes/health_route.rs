//! GET /health: delegate probe plus document status.

use std::sync::Arc;

use ai_llm_service::HealthStatus;
use axum::{Json, extract::State};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Mirrors `provider.ok`.
    pub ok: bool,
    pub document_loaded: bool,
    pub provider: HealthStatus,
}

/// Always 200; an unreachable provider shows up as `ok: false`.
#[instrument(name = "health_route", skip_all)]
pub async fn health_route(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let provider = state.llm.health().await;
    let document_loaded = state.qa.store().has_document();
    debug!(ok = provider.ok, document_loaded, "health probed");

    Json(HealthResponse {
        ok: provider.ok,
        document_loaded,
        provider,
    })
}
