//! Provider-agnostic streaming chat interface.
//!
//! Every backend turns its wire format into a [`FragmentStream`]: an ordered,
//! finite, non-restartable sequence of [`Fragment`]s produced lazily while the
//! model generates. Consumers depend on [`ChatStream`] only.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error_handler::AiLlmError;

/// Speaker of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One ordered turn sent to the delegate model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One incremental event of a streamed response.
///
/// `text` is `None` for events that carry no payload (role headers, usage
/// reports, the final `done` marker).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Boxed fragment stream returned by [`ChatStream::stream_chat`].
pub type FragmentStream = BoxStream<'static, Result<Fragment, AiLlmError>>;

/// A delegate model that answers a list of turns with a fragment stream.
///
/// Opening the stream may fail (transport, auth, bad status); every item of
/// the stream may fail as well (broken connection, malformed event, in-band
/// provider error).
#[async_trait]
pub trait ChatStream: Send + Sync {
    async fn stream_chat(&self, turns: &[ChatTurn]) -> Result<FragmentStream, AiLlmError>;
}
