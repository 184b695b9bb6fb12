//! Error types for completion requests.

use mentor_core::error::MentorError;

/// Errors from the completion provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("model refused: {0}")]
    Refusal(String),
    #[error("response does not match the answer schema: {0}")]
    Schema(String),
    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),
}

impl From<LlmError> for MentorError {
    fn from(err: LlmError) -> Self {
        MentorError::Completion(err.to_string())
    }
}
