//! Lightweight Ollama service for streamed chat.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat` with `stream=true` (newline-delimited JSON)
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    chat::{ChatRole, ChatStream, ChatTurn, Fragment, FragmentStream},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, ProviderError, ProviderErrorKind, is_http_endpoint, make_snippet,
    },
    stream::{fragments, lines},
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses one HTTP client for
/// all calls.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }
        if !is_http_endpoint(&cfg.endpoint) {
            return Err(err(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.unwrap_or(10)))
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **streaming** chat request via `/api/chat`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `messages`     ← turns, in order
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    #[instrument(skip_all, fields(model = %self.cfg.model, turns = turns.len()))]
    pub async fn stream_chat_ndjson(
        &self,
        turns: &[ChatTurn],
    ) -> Result<FragmentStream, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, turns);

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Ollama /api/chat returned non-success status"
            );

            return Err(err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })));
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            "Ollama chat stream opened"
        );

        Ok(fragments(
            lines(resp.bytes_stream()),
            LlmProvider::Ollama,
            parse_ndjson_line,
        ))
    }
}

#[async_trait]
impl ChatStream for OllamaService {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        self.stream_chat_ndjson(turns).await
    }
}

fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::Ollama, kind).into()
}

/// Parses one NDJSON line of a streamed `/api/chat` response.
pub(crate) fn parse_ndjson_line(line: &str) -> Result<Option<Fragment>, ProviderErrorKind> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: ChatChunk = serde_json::from_str(line).map_err(|e| {
        ProviderErrorKind::Decode(format!("serde error: {e}; expected `{{ message, done }}`"))
    })?;

    if let Some(message) = chunk.error {
        return Err(ProviderErrorKind::Upstream(message));
    }

    let text = chunk
        .message
        .map(|m| m.content)
        .filter(|t| !t.is_empty());
    let finish_reason = if chunk.done {
        Some(chunk.done_reason.unwrap_or_else(|| "stop".to_string()))
    } else {
        None
    };

    Ok(Some(Fragment {
        text,
        finish_reason,
    }))
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, turns: &'a [ChatTurn]) -> Self {
        let messages = turns
            .iter()
            .map(|t| ChatMessage {
                role: match t.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "assistant",
                },
                content: &t.content,
            })
            .collect();

        let options = ChatOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            messages,
            stream: true,
            options: Some(options),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// One line of the `/api/chat` stream.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}
