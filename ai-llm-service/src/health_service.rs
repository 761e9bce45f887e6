//! Health checks for the delegate model backend.
//!
//! Lightweight probes per provider:
//! - Gemini: `GET {endpoint}/v1beta/models/{model}` (model metadata)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth (best-effort model existence check)
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, is_http_endpoint, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Gemini", "Ollama").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional probe timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(timeout_secs = timeout.as_secs(), "HealthService initialized");

        Ok(Self { client, timeout })
    }

    /// Checks health for the given config.
    ///
    /// Never returns an error. Any failure is converted to
    /// `HealthStatus { ok: false, message: ... }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        if !is_http_endpoint(&cfg.endpoint) {
            warn!(
                provider = ?cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        match self.try_probe(cfg).await {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %status.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    model = %status.model,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Strict probe. Returns an error on transport failures and non-2xx statuses.
    async fn try_probe(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let base = cfg.endpoint.trim().trim_end_matches('/');
        let url = match cfg.provider {
            LlmProvider::Gemini => format!("{base}/v1beta/models/{}", cfg.model),
            LlmProvider::OpenAI => format!("{base}/v1/models"),
            LlmProvider::Ollama => format!("{base}/api/tags"),
        };

        let mut req = self.client.get(&url).timeout(self.timeout);
        match (cfg.provider, cfg.api_key.as_deref()) {
            (LlmProvider::Gemini, Some(key)) => req = req.header("x-goog-api-key", key),
            (LlmProvider::OpenAI, Some(key)) => {
                req = req.header(header::AUTHORIZATION, format!("Bearer {key}"))
            }
            (LlmProvider::Ollama, _) => {}
            (_, None) => {
                return Err(HealthError::Decode("missing API key".into()).into());
            }
        }

        debug!(provider = ?cfg.provider, model = %cfg.model, "GET {}", url);
        let start = Instant::now();
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })
            .into());
        }

        let status = match cfg.provider {
            // A 2xx on the model resource already proves the model exists.
            LlmProvider::Gemini => {
                HealthStatus::new(cfg, true, latency, "Gemini is healthy; model is available")
            }
            LlmProvider::OpenAI => match resp.json::<OpenAiModels>().await {
                Ok(list) => model_listed(
                    cfg,
                    latency,
                    list.data.iter().any(|m| m.id == cfg.model),
                    "/v1/models",
                ),
                Err(e) => reachable_undecoded(cfg, latency, "/v1/models", e),
            },
            LlmProvider::Ollama => match resp.json::<OllamaTags>().await {
                Ok(tags) => model_listed(
                    cfg,
                    latency,
                    tags.models.iter().any(|m| m.name == cfg.model),
                    "/api/tags",
                ),
                Err(e) => reachable_undecoded(cfg, latency, "/api/tags", e),
            },
        };

        Ok(status)
    }
}

fn model_listed(cfg: &LlmModelConfig, latency: u128, exists: bool, path: &str) -> HealthStatus {
    if exists {
        HealthStatus::new(
            cfg,
            true,
            latency,
            format!("{:?} is healthy; model is available", cfg.provider),
        )
    } else {
        HealthStatus::new(
            cfg,
            false,
            latency,
            format!("{:?} is up, but model not found in {path}", cfg.provider),
        )
    }
}

fn reachable_undecoded(
    cfg: &LlmModelConfig,
    latency: u128,
    path: &str,
    e: reqwest::Error,
) -> HealthStatus {
    warn!(
        provider = ?cfg.provider,
        error = %e,
        "failed to decode {path}; treating server as reachable"
    );
    HealthStatus::new(
        cfg,
        true,
        latency,
        format!("{:?} is reachable; failed to decode {path}: {e}", cfg.provider),
    )
}

#[derive(Deserialize)]
struct OpenAiModels {
    data: Vec<OpenAiModel>,
}

#[derive(Deserialize)]
struct OpenAiModel {
    id: String,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            connect_timeout_secs: None,
        }
    }

    #[tokio::test]
    async fn invalid_endpoint_reports_not_ok_without_network() {
        let svc = HealthService::new(Some(1)).unwrap();
        let status = svc.check(&cfg("localhost:11434")).await;
        assert!(!status.ok);
        assert_eq!(status.latency_ms, 0);
        assert_eq!(status.provider, "Ollama");
    }

    #[test]
    fn model_presence_decides_ok_flag() {
        let c = cfg("http://localhost:11434");
        assert!(model_listed(&c, 3, true, "/api/tags").ok);
        let missing = model_listed(&c, 3, false, "/api/tags");
        assert!(!missing.ok);
        assert!(missing.message.contains("/api/tags"));
    }
}
