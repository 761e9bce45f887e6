//! Handler test fixtures: a scripted delegate and an isolated `AppState`.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::{
    AiLlmError, ChatStream, ChatTurn, Fragment, FragmentStream, LlmService, ProviderError,
    ProviderErrorKind,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use grounded_qa::{DocumentStore, GroundedQa, QaConfig};

use crate::core::app_state::AppState;

/// Replies with fixed fragments, or fails when opened.
pub struct ScriptedLlm {
    reply: Result<Vec<&'static str>, &'static str>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn replying(fragments: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(fragments),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatStream for ScriptedLlm {
    async fn stream_chat(&self, _turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(fragments) => {
                let items: Vec<Result<Fragment, AiLlmError>> =
                    fragments.iter().map(|t| Ok(Fragment::text(*t))).collect();
                Ok(stream::iter(items).boxed())
            }
            Err(message) => Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Upstream((*message).to_string()),
            )
            .into()),
        }
    }
}

/// Ollama config pointing at a closed local port; building it needs no network.
fn offline_llm() -> Arc<LlmService> {
    let cfg = LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: "qwen3:14b".into(),
        endpoint: "http://127.0.0.1:9".into(),
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        connect_timeout_secs: Some(1),
    };
    Arc::new(LlmService::new(cfg, Some(1)).expect("offline llm service"))
}

/// Fresh state with an empty document store answering through `delegate`.
pub fn state_with(delegate: Arc<ScriptedLlm>) -> Arc<AppState> {
    let qa = GroundedQa::from_config(
        &QaConfig::default(),
        Arc::new(DocumentStore::new()),
        delegate,
    );
    Arc::new(AppState::new(Arc::new(qa), offline_llm()))
}
