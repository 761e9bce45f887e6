//! Test delegate: replays a fixed fragment script and records what it received.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use ai_llm_service::{
    AiLlmError, ChatStream, ChatTurn, Fragment, FragmentStream, ProviderError, ProviderErrorKind,
    config::llm_provider::LlmProvider,
};
use async_trait::async_trait;
use futures::{StreamExt, stream};

/// One scripted stream item.
#[derive(Debug, Clone)]
pub enum Step {
    Text(&'static str),
    Empty,
    Fail(&'static str),
}

pub struct StubLlm {
    script: Vec<Step>,
    open_error: Option<&'static str>,
    hang: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<Vec<ChatTurn>>>,
}

impl StubLlm {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            open_error: None,
            hang: false,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn text_only(text: &'static str) -> Self {
        Self::new(vec![Step::Text(text)])
    }

    /// Fails when the stream is opened (auth, network, bad status).
    pub fn failing_open(message: &'static str) -> Self {
        let mut stub = Self::new(Vec::new());
        stub.open_error = Some(message);
        stub
    }

    /// Emits the script, then never completes.
    pub fn hanging(script: Vec<Step>) -> Self {
        let mut stub = Self::new(script);
        stub.hang = true;
        stub
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Vec<ChatTurn>> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

fn upstream(message: &str) -> AiLlmError {
    ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::Upstream(message.to_string())).into()
}

#[async_trait]
impl ChatStream for StubLlm {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut r) = self.received.lock() {
            r.push(turns.to_vec());
        }
        if let Some(message) = self.open_error {
            return Err(upstream(message));
        }

        let items: Vec<Result<Fragment, AiLlmError>> = self
            .script
            .iter()
            .map(|step| match step {
                Step::Text(t) => Ok(Fragment::text(*t)),
                Step::Empty => Ok(Fragment::empty()),
                Step::Fail(m) => Err(upstream(m)),
            })
            .collect();

        let scripted = stream::iter(items);
        if self.hang {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }
}
