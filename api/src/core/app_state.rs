use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmService, config::default_config::config_from_env};
use grounded_qa::{DocumentStore, GroundedQa, QaConfig, cfg::QaConfigError};
use thiserror::Error;

/// Default listen address when `API_ADDRESS` is unset.
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:3000";

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Qa(#[from] QaConfigError),

    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Question-answering pipeline over the process-wide document.
    pub qa: Arc<GroundedQa>,
    /// Delegate model client, kept for health probes.
    pub llm: Arc<LlmService>,
}

impl AppState {
    pub fn new(qa: Arc<GroundedQa>, llm: Arc<LlmService>) -> Self {
        Self { qa, llm }
    }

    /// Builds the delegate client, the document store and the pipeline from
    /// environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let health_timeout = match std::env::var("HEALTH_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => Some(v.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidNumber {
                    var: "HEALTH_TIMEOUT_SECS",
                    reason: "expected u64",
                }
            })?),
            _ => None,
        };

        let llm = Arc::new(LlmService::new(config_from_env()?, health_timeout)?);
        let qa_cfg = QaConfig::from_env()?;
        let store = Arc::new(DocumentStore::new());
        let qa = GroundedQa::from_config(&qa_cfg, store, llm.clone());

        Ok(Self::new(Arc::new(qa), llm))
    }
}

/// Listen address from `API_ADDRESS`, or [`DEFAULT_API_ADDRESS`].
pub fn api_address() -> String {
    std::env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string())
}
