//! Delegate model config loaded strictly from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`                 = `gemini` (default) | `openai` | `ollama`
//! - `LLM_MAX_TOKENS`           = optional max tokens (u32)
//! - `LLM_TEMPERATURE`          = optional temperature (f32, `0.0..=2.0`)
//! - `LLM_CONNECT_TIMEOUT_SECS` = connect timeout (u64, default 10)
//!
//! Gemini:
//! - `GEMINI_API_KEY` (mandatory), `GEMINI_MODEL`, `GEMINI_URL`
//!
//! OpenAI:
//! - `OPENAI_API_KEY` (mandatory), `OPENAI_MODEL`, `OPENAI_URL`
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` (mandatory), `OLLAMA_MODEL` (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, env_or, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builds the delegate config for the provider selected by `LLM_KIND`.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - [`ConfigError::MissingVar`] when a mandatory variable is absent
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad knobs
pub fn config_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider: LlmProvider = env_or("LLM_KIND", "gemini").parse()?;

    let mut cfg = match provider {
        LlmProvider::Gemini => config_gemini()?,
        LlmProvider::OpenAI => config_openai()?,
        LlmProvider::Ollama => config_ollama()?,
    };

    cfg.max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    if let Some(t) = env_opt_f32("LLM_TEMPERATURE")? {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
        cfg.temperature = Some(t);
    }
    cfg.connect_timeout_secs = Some(
        env_opt_u64("LLM_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
    );

    if cfg.model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    Ok(cfg)
}

/// Constructs a config for Google Gemini.
///
/// # Defaults
/// - `GEMINI_MODEL = gemini-2.5-flash`
/// - `temperature = Some(0.2)` (grounded answers favour low randomness)
pub fn config_gemini() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let endpoint = env_or("GEMINI_URL", DEFAULT_GEMINI_URL);
    validate_http_endpoint("GEMINI_URL", &endpoint)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: Some(0.2),
        top_p: None,
        connect_timeout_secs: None,
    })
}

/// Constructs a config for an OpenAI-compatible API.
///
/// # Defaults
/// - `OPENAI_MODEL = gpt-4o-mini`
/// - `temperature = Some(0.2)`
pub fn config_openai() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_or("OPENAI_URL", DEFAULT_OPENAI_URL);
    validate_http_endpoint("OPENAI_URL", &endpoint)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: Some(0.2),
        top_p: None,
        connect_timeout_secs: None,
    })
}

/// Constructs a config for a local Ollama model.
///
/// # Env
/// - `OLLAMA_URL` or `OLLAMA_PORT` (required)
/// - `OLLAMA_MODEL` (required)
pub fn config_ollama() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint,
        api_key: None,
        max_tokens: None,
        temperature: Some(0.2),
        top_p: None,
        connect_timeout_secs: None,
    })
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{}", port.trim()));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}
