use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use grounded_qa::QaError;
use serde::Serialize;
use thiserror::Error;

use crate::core::app_state::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Failure from the question-answering pipeline.
    #[error(transparent)]
    Qa(#[from] QaError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Qa(QaError::InvalidInput(_))
            | AppError::Qa(QaError::QuestionRequired)
            | AppError::Qa(QaError::NoDocument) => StatusCode::BAD_REQUEST,

            // upstream
            AppError::Qa(QaError::Provider(_)) => StatusCode::BAD_GATEWAY,

            // 5xx
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Qa(QaError::InvalidInput(_)) => "INVALID_INPUT",
            AppError::Qa(QaError::QuestionRequired) => "QUESTION_REQUIRED",
            AppError::Qa(QaError::NoDocument) => "NO_DOCUMENT",
            AppError::Qa(QaError::Provider(_)) => "PROVIDER_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert JSON body rejections (bad syntax, wrong types, content type) to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_and_provider_failures_map_to_distinct_statuses() {
        assert_eq!(
            AppError::from(QaError::QuestionRequired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(QaError::NoDocument).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(QaError::Provider("down".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn no_document_and_provider_messages_differ() {
        let no_doc = AppError::from(QaError::NoDocument);
        let provider = AppError::from(QaError::Provider("down".into()));
        assert_eq!(no_doc.to_string(), "No base text uploaded");
        assert_ne!(no_doc.to_string(), provider.to_string());
        assert_ne!(no_doc.error_code(), provider.error_code());
    }
}
