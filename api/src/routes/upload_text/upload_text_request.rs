use serde::{Deserialize, Serialize};

/// Request payload for /upload_text.
#[derive(Debug, Default, Deserialize)]
pub struct UploadTextRequest {
    /// New reference document; missing, null or empty clears it.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTextResponse {
    pub message: String,
    /// Stored length in characters.
    pub text_length: usize,
}
