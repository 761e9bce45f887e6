use crate::config::llm_provider::LlmProvider;

/// Configuration for the delegate model connection.
///
/// One value is built at startup and handed to [`crate::service::LlmService`];
/// clients never read the environment on their own.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "qwen3:14b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     max_tokens: Some(1024),
///     temperature: Some(0.2),
///     top_p: None,
///     connect_timeout_secs: Some(10),
/// };
/// assert!(cfg.api_key.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gemini-2.5-flash"`, `"gpt-4o-mini"`).
    pub model: String,

    /// Base URL of the provider API, without a trailing path.
    pub endpoint: String,

    /// API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// TCP/TLS connect timeout in seconds. Streaming bodies are not bounded
    /// here; callers apply their own overall deadline.
    pub connect_timeout_secs: Option<u64>,
}
