//! Delegate LLM clients with a single streaming interface.
//!
//! Public surface:
//! - [`ChatStream`]: the seam consumers depend on (`turns` in, fragments out)
//! - [`LlmService`]: the configured provider client (Gemini, OpenAI or Ollama)
//! - [`config::default_config::config_from_env`]: env-driven configuration
//! - [`telemetry`]: tracing subscriber setup for binaries

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service;
pub mod services;
pub mod telemetry;

mod stream;

pub use chat::{ChatRole, ChatStream, ChatTurn, Fragment, FragmentStream};
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use health_service::HealthStatus;
pub use service::LlmService;
