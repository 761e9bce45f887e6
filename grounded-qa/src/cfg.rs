//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use thiserror::Error;

use crate::prompt::PromptLanguage;

/// Default overall deadline for one answer, in seconds.
pub const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum QaConfigError {
    #[error("invalid value in {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Knobs for the question-answering pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QaConfig {
    /// Working language of the prompt and refusal sentence.
    pub language: PromptLanguage,
    /// Overall deadline for one delegate call; `None` waits forever.
    pub answer_timeout: Option<Duration>,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            language: PromptLanguage::English,
            answer_timeout: Some(Duration::from_secs(DEFAULT_ANSWER_TIMEOUT_SECS)),
        }
    }
}

impl QaConfig {
    /// Reads `QA_LANGUAGE` (`en` | `pt`) and `ANSWER_TIMEOUT_SECS` (`0` disables).
    pub fn from_env() -> Result<Self, QaConfigError> {
        let language = match std::env::var("QA_LANGUAGE") {
            Ok(v) if !v.trim().is_empty() => v.parse().map_err(|reason| QaConfigError::Invalid {
                var: "QA_LANGUAGE",
                reason,
            })?,
            _ => PromptLanguage::English,
        };

        let secs = match std::env::var("ANSWER_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => {
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| QaConfigError::Invalid {
                        var: "ANSWER_TIMEOUT_SECS",
                        reason: "expected u64".into(),
                    })?
            }
            _ => DEFAULT_ANSWER_TIMEOUT_SECS,
        };

        Ok(Self {
            language,
            answer_timeout: timeout_from_secs(secs),
        })
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
