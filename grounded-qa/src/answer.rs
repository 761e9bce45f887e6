//! Answer service: one delegate call, streamed, aggregated into one string.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use ai_llm_service::{AiLlmError, ChatStream, ChatTurn};
use futures::TryStreamExt;
use tracing::{error, info, instrument, warn};

use crate::{document_store::is_present, error::QaError};

/// Sends grounded prompts to the injected delegate and returns whole answers.
///
/// Partial fragments never leave this type: the caller gets the full trimmed
/// text or a [`QaError::Provider`].
pub struct AnswerService {
    client: Arc<dyn ChatStream>,
    timeout: Option<Duration>,
}

impl AnswerService {
    /// No timeout; a hung provider blocks the request until the caller gives up.
    pub fn new(client: Arc<dyn ChatStream>) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Bounds the whole call (open + stream) by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asks the delegate with the document as first turn and `prompt` as second.
    ///
    /// # Errors
    /// - [`QaError::NoDocument`] if `document` is blank; the delegate is not called
    /// - [`QaError::Provider`] for any delegate failure, including timeout
    #[instrument(skip_all, fields(doc_len = document.len(), prompt_len = prompt.len()))]
    pub async fn ask(&self, document: &str, prompt: &str) -> Result<String, QaError> {
        if !is_present(document) {
            warn!("ask rejected: no document loaded");
            return Err(QaError::NoDocument);
        }

        let turns = [ChatTurn::user(document), ChatTurn::user(prompt)];
        let started = Instant::now();

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.collect(&turns))
                .await
                .unwrap_or(Err(AiLlmError::Timeout(limit))),
            None => self.collect(&turns).await,
        };

        match result {
            Ok(answer) => {
                info!(
                    answer_len = answer.len(),
                    latency_ms = started.elapsed().as_millis(),
                    "answer aggregated"
                );
                Ok(answer)
            }
            Err(err) => {
                error!(
                    error = %err,
                    latency_ms = started.elapsed().as_millis(),
                    "delegate model failed"
                );
                Err(QaError::Provider(err.to_string()))
            }
        }
    }

    async fn collect(&self, turns: &[ChatTurn]) -> Result<String, AiLlmError> {
        let mut stream = self.client.stream_chat(turns).await?;
        let mut buf = String::new();
        while let Some(fragment) = stream.try_next().await? {
            if let Some(text) = fragment.text {
                buf.push_str(&text);
            }
        }
        Ok(buf.trim().to_string())
    }
}
