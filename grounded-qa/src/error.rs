//! Typed error for the grounded-qa crate.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QaError {
    /// Prompt inputs were blank after trimming.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The ask request carried no usable question.
    #[error("Question is required")]
    QuestionRequired,

    /// No reference document is loaded.
    #[error("No base text uploaded")]
    NoDocument,

    /// The delegate model failed; carries the provider's message.
    #[error("AI provider failed: {0}")]
    Provider(String),
}

impl QaError {
    /// True for failures caused by the caller (bad input or missing document).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QaError::Provider(_))
    }
}
