//! Shared delegate model service.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once at startup, wrap in `Arc`, and hand it to dependents.
//! - Holds exactly one provider client built from one [`LlmModelConfig`],
//!   so the HTTP connection pool and credentials are reused across calls.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{ChatStream, ChatTurn, LlmService};
//! use ai_llm_service::config::default_config::config_from_env;
//! use futures::TryStreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmService::new(config_from_env()?, Some(10))?);
//! let stream = svc.stream_chat(&[ChatTurn::user("Hello")]).await?;
//! let fragments: Vec<_> = stream.try_collect().await?;
//! println!("{} fragments", fragments.len());
//! # Ok(()) }
//! ```

use async_trait::async_trait;

use crate::{
    chat::{ChatStream, ChatTurn, FragmentStream},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{
        gemini_service::GeminiService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// The configured delegate client plus its health checker.
pub struct LlmService {
    cfg: LlmModelConfig,
    backend: Backend,
    health: HealthService,
}

enum Backend {
    Gemini(GeminiService),
    OpenAI(OpenAiService),
    Ollama(OllamaService),
}

impl LlmService {
    /// Builds the provider client selected by `cfg.provider`.
    ///
    /// # Errors
    /// Propagates client construction errors (missing key, bad endpoint).
    pub fn new(cfg: LlmModelConfig, health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let backend = match cfg.provider {
            LlmProvider::Gemini => Backend::Gemini(GeminiService::new(cfg.clone())?),
            LlmProvider::OpenAI => Backend::OpenAI(OpenAiService::new(cfg.clone())?),
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
        };

        Ok(Self {
            cfg,
            backend,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Returns the active config.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Probes the configured provider. Never fails.
    pub async fn health(&self) -> HealthStatus {
        self.health.check(&self.cfg).await
    }
}

#[async_trait]
impl ChatStream for LlmService {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        match &self.backend {
            Backend::Gemini(cli) => cli.stream_generate(turns).await,
            Backend::OpenAI(cli) => cli.stream_completion(turns).await,
            Backend::Ollama(cli) => cli.stream_chat_ndjson(turns).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_backend_matching_provider() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            connect_timeout_secs: Some(1),
        };
        let svc = LlmService::new(cfg.clone(), Some(1)).unwrap();
        assert!(matches!(svc.backend, Backend::Ollama(_)));
        assert_eq!(svc.config(), &cfg);
    }

    #[test]
    fn missing_key_fails_construction() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            connect_timeout_secs: None,
        };
        assert!(LlmService::new(cfg, None).is_err());
    }
}
