//! Document-grounded question answering.
//!
//! Public API: [`GroundedQa`]. It owns the shared [`DocumentStore`], builds a
//! grounding prompt for each question with [`PromptBuilder`] and asks the
//! delegate model through [`AnswerService`], returning one aggregated answer.
//!
//! Consistency: the document is read once per question and that copy is used
//! for both the prompt and the delegate call. Updates racing with a question
//! are not serialised; the last writer wins and a question already in flight
//! keeps the text it read.

pub mod answer;
pub mod cfg;
pub mod document_store;
pub mod error;
pub mod prompt;

#[cfg(test)]
mod stub_llm;

use std::sync::Arc;

use ai_llm_service::ChatStream;
use tracing::{info, instrument, warn};

pub use answer::AnswerService;
pub use cfg::QaConfig;
pub use document_store::DocumentStore;
pub use error::QaError;
pub use prompt::{PromptBuilder, PromptLanguage, build_prompt};

/// Outcome of a set/clear request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentUpdate {
    /// True when the stored text is now empty.
    pub cleared: bool,
    /// Stored length in characters, 0 when cleared.
    pub text_length: usize,
}

/// The question-answering pipeline over one shared document.
pub struct GroundedQa {
    store: Arc<DocumentStore>,
    prompts: PromptBuilder,
    answers: AnswerService,
}

impl GroundedQa {
    pub fn new(store: Arc<DocumentStore>, prompts: PromptBuilder, answers: AnswerService) -> Self {
        Self {
            store,
            prompts,
            answers,
        }
    }

    /// Wires a pipeline from config around an injected delegate client.
    pub fn from_config(
        cfg: &QaConfig,
        store: Arc<DocumentStore>,
        client: Arc<dyn ChatStream>,
    ) -> Self {
        Self::new(
            store,
            PromptBuilder::new(cfg.language),
            AnswerService::new(client).with_timeout(cfg.answer_timeout),
        )
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// The refusal sentence the model was told to use.
    pub fn refusal(&self) -> &'static str {
        self.prompts.language().refusal()
    }

    /// Replaces the document; `None` or `""` clears it.
    pub fn set_document(&self, text: Option<String>) -> DocumentUpdate {
        let text = text.unwrap_or_default();
        let cleared = text.is_empty();
        let text_length = self.store.set_document(text);
        info!(cleared, text_length, "reference document updated");
        DocumentUpdate {
            cleared,
            text_length,
        }
    }

    /// Answers `question` from the current document.
    ///
    /// # Errors
    /// - [`QaError::QuestionRequired`] if the question is missing or blank
    /// - [`QaError::NoDocument`] if no document is loaded
    /// - [`QaError::Provider`] if the delegate fails
    #[instrument(skip_all, fields(question_len = question.map(str::len).unwrap_or(0)))]
    pub async fn ask(&self, question: Option<&str>) -> Result<String, QaError> {
        let question = match question {
            Some(q) if !q.trim().is_empty() => q,
            _ => {
                warn!("ask rejected: question is required");
                return Err(QaError::QuestionRequired);
            }
        };

        let document = self.store.get_document();
        if !document_store::is_present(&document) {
            warn!("ask rejected: no document loaded");
            return Err(QaError::NoDocument);
        }

        let prompt = self.prompts.build(&document, question)?;
        self.answers.ask(&document, &prompt).await
    }
}
