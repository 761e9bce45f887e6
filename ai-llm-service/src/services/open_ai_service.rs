//! OpenAI (ChatGPT) service for streamed chat completions.
//!
//! Endpoint derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions with `stream: true` (server-sent events)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    chat::{ChatRole, ChatStream, ChatTurn, Fragment, FragmentStream},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, ProviderError, ProviderErrorKind, is_http_endpoint, make_snippet,
    },
    stream::{fragments, lines, sse_payload},
};

/// Thin client for the OpenAI API (ChatGPT).
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with connect timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        // 1) Provider must be OpenAI.
        if cfg.provider != LlmProvider::OpenAI {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }

        // 2) API key must be present.
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| err(ProviderErrorKind::MissingApiKey))?;

        // 3) Endpoint must use http/https.
        if !is_http_endpoint(&cfg.endpoint) {
            return Err(err(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        // 4) HTTP client: connect timeout + default headers.
        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(
            |e| err(ProviderErrorKind::Decode(format!("invalid API key header: {e}"))),
        )?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.unwrap_or(10)))
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **streaming** chat completion request.
    ///
    /// Each turn becomes one message, in order. Mapped options from config:
    /// `model`, `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    #[instrument(skip_all, fields(model = %self.cfg.model, turns = turns.len()))]
    pub async fn stream_completion(
        &self,
        turns: &[ChatTurn],
    ) -> Result<FragmentStream, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, turns);

        debug!(
            endpoint = %self.cfg.endpoint,
            prompt_len = turns.iter().map(|t| t.content.len()).sum::<usize>(),
            "POST {}", self.url_chat
        );

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
                "OpenAI /v1/chat/completions returned non-success status"
            );

            return Err(err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })));
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion stream opened"
        );

        Ok(fragments(
            lines(resp.bytes_stream()),
            LlmProvider::OpenAI,
            parse_sse_line,
        ))
    }
}

#[async_trait]
impl ChatStream for OpenAiService {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        self.stream_completion(turns).await
    }
}

fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::OpenAI, kind).into()
}

/// Parses one SSE line of a streamed chat completion.
pub(crate) fn parse_sse_line(line: &str) -> Result<Option<Fragment>, ProviderErrorKind> {
    let Some(payload) = sse_payload(line) else {
        return Ok(None);
    };
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(payload).map_err(|e| {
        ProviderErrorKind::Decode(format!(
            "serde error: {e}; expected `choices[0].delta.content`"
        ))
    })?;

    if let Some(e) = chunk.error {
        return Err(ProviderErrorKind::Upstream(e.message));
    }

    // Usage-only chunks have an empty `choices` array.
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(Some(Fragment::empty()));
    };

    Ok(Some(Fragment {
        text: choice.delta.and_then(|d| d.content).filter(|t| !t.is_empty()),
        finish_reason: choice.finish_reason,
    }))
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
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

        Self {
            model: &cfg.model,
            messages,
            stream: true,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Chat message for the OpenAI API.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// One `chat.completion.chunk` event.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<Delta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/".into(),
            api_key: Some("sk-test".into()),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            connect_timeout_secs: Some(5),
        }
    }

    #[test]
    fn request_is_streaming_with_ordered_user_messages() {
        let cfg = cfg();
        let turns = vec![ChatTurn::user("doc"), ChatTurn::user("question")];
        let json = serde_json::to_value(ChatCompletionRequest::from_cfg(&cfg, &turns)).unwrap();

        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "doc");
        assert_eq!(json["messages"][1]["content"], "question");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn parses_delta_and_role_only_chunks() {
        let role = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(role).unwrap(), Some(Fragment::empty()));

        let text = r#"data: {"choices":[{"index":0,"delta":{"content":"Blue"},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(text).unwrap(), Some(Fragment::text("Blue")));

        let stop = r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        let frag = parse_sse_line(stop).unwrap().unwrap();
        assert_eq!(frag.text, None);
        assert_eq!(frag.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn done_marker_and_blank_lines_are_skipped() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), None);
        assert_eq!(parse_sse_line("").unwrap(), None);
    }

    #[test]
    fn in_band_error_is_upstream() {
        let e = parse_sse_line(r#"data: {"error":{"message":"server overloaded","type":"server_error"}}"#)
            .unwrap_err();
        assert!(matches!(e, ProviderErrorKind::Upstream(m) if m == "server overloaded"));
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let svc = OpenAiService::new(cfg()).unwrap();
        assert_eq!(svc.url_chat, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn rejects_wrong_provider() {
        let mut c = cfg();
        c.provider = LlmProvider::Ollama;
        assert!(OpenAiService::new(c).is_err());
    }
}
