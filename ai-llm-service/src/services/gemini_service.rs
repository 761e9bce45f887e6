//! Google Gemini client for streamed text generation.
//!
//! Endpoint derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1beta/models/{model}:streamGenerateContent?alt=sse
//!
//! The API key travels in the `x-goog-api-key` header so it never shows up in
//! URLs that end up in logs or error snippets.

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

/// Thin streaming client for the Gemini `generateContent` family.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_stream: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Gemini
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is not http(s)
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(err(ProviderErrorKind::InvalidProvider));
        }
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| err(ProviderErrorKind::MissingApiKey))?;
        if !is_http_endpoint(&cfg.endpoint) {
            return Err(err(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(&api_key).map_err(|e| {
            err(ProviderErrorKind::Decode(format!("invalid API key header: {e}")))
        })?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.unwrap_or(10)))
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/');
        let url_stream = format!(
            "{base}/v1beta/models/{}:streamGenerateContent?alt=sse",
            cfg.model
        );

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_stream,
        })
    }

    /// Opens a streamed generation and returns its fragments.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses (body snippet included)
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    #[instrument(skip_all, fields(model = %self.cfg.model, turns = turns.len()))]
    pub async fn stream_generate(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, turns);

        debug!("POST {}", self.url_stream);
        let resp = self.client.post(&self.url_stream).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_stream.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Gemini streamGenerateContent returned non-success status"
            );

            return Err(err(ProviderErrorKind::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })));
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            "Gemini stream opened"
        );

        Ok(fragments(
            lines(resp.bytes_stream()),
            LlmProvider::Gemini,
            parse_sse_line,
        ))
    }
}

#[async_trait]
impl ChatStream for GeminiService {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        self.stream_generate(turns).await
    }
}

fn err(kind: ProviderErrorKind) -> AiLlmError {
    ProviderError::new(LlmProvider::Gemini, kind).into()
}

/// Parses one SSE line of a `streamGenerateContent?alt=sse` response.
pub(crate) fn parse_sse_line(line: &str) -> Result<Option<Fragment>, ProviderErrorKind> {
    let Some(payload) = sse_payload(line) else {
        return Ok(None);
    };
    if payload.is_empty() {
        return Ok(None);
    }

    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| ProviderErrorKind::Decode(format!("serde error: {e}; expected GenerateContentResponse")))?;

    if let Some(e) = chunk.error {
        return Err(ProviderErrorKind::Upstream(e.message));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderErrorKind::Upstream(format!(
            "prompt blocked: {reason}"
        )));
    }

    let candidate = chunk.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let text: Option<String> = candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty());

    Ok(Some(Fragment {
        text,
        finish_reason,
    }))
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, turns: &'a [ChatTurn]) -> Self {
        let contents = turns
            .iter()
            .map(|t| Content {
                role: t.role,
                parts: vec![Part { text: &t.content }],
            })
            .collect();

        let generation_config = GenerationConfig {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_tokens,
        };

        Self {
            contents,
            generation_config: Some(generation_config),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: ChatRole,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_keeps_turn_order_and_roles() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: Some("k".into()),
            max_tokens: Some(256),
            temperature: Some(0.2),
            top_p: None,
            connect_timeout_secs: None,
        };
        let turns = vec![ChatTurn::user("doc"), ChatTurn::user("question")];
        let json = serde_json::to_value(GenerateContentRequest::from_cfg(&cfg, &turns)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "doc");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "question");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
        assert!(json["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn parses_text_chunk() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Par"},{"text":"is"}],"role":"model"}}]}"#;
        let frag = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(frag.text.as_deref(), Some("Paris"));
        assert!(frag.finish_reason.is_none());
    }

    #[test]
    fn final_chunk_without_text_is_an_empty_fragment() {
        let line = r#"data: {"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":12}}"#;
        let frag = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(frag.text, None);
        assert_eq!(frag.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert!(parse_sse_line("").unwrap().is_none());
        assert!(parse_sse_line(": ping").unwrap().is_none());
    }

    #[test]
    fn in_band_error_and_block_are_upstream_errors() {
        let e = parse_sse_line(r#"data: {"error":{"code":429,"message":"Resource exhausted"}}"#)
            .unwrap_err();
        assert!(matches!(e, ProviderErrorKind::Upstream(m) if m == "Resource exhausted"));

        let b = parse_sse_line(r#"data: {"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(b, ProviderErrorKind::Upstream(m) if m.contains("SAFETY")));
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        let e = parse_sse_line("data: {not json").unwrap_err();
        assert!(matches!(e, ProviderErrorKind::Decode(_)));
    }

    #[test]
    fn rejects_missing_key() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            connect_timeout_secs: None,
        };
        let e = GeminiService::new(cfg).unwrap_err();
        assert!(e.to_string().contains("missing API key"));
    }
}
