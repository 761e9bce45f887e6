use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Every provider is consumed through its streaming endpoint; see
/// [`crate::chat::ChatStream`].
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let provider: LlmProvider = "gemini".parse().unwrap();
/// assert_eq!(provider, LlmProvider::Gemini);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini (`generativelanguage.googleapis.com`).
    Gemini,
    /// OpenAI-compatible chat completions API.
    OpenAI,
    /// Local Ollama runtime for on-device inference.
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
