use serde::{Deserialize, Serialize};

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question. Missing, null and blank are rejected by the handler.
    #[serde(default)]
    pub question: Option<String>,
}

/// Response payload for /ask.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Final model answer (plain text, trimmed).
    pub answer: String,
}
