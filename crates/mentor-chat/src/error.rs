//! Error types for the conversation layer.

use mentor_core::error::MentorError;
use mentor_llm::LlmError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("completion failed: {0}")]
    Llm(#[from] LlmError),
    #[error("a request is already in flight")]
    RequestInFlight,
    #[error("no failed turn to retry")]
    NoFailedTurn,
    #[error("chat not found: {0}")]
    ChatNotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<MentorError> for ChatError {
    fn from(err: MentorError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<ChatError> for MentorError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Llm(e) => e.into(),
            other => MentorError::Chat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::RequestInFlight.to_string(),
            "a request is already in flight"
        );
        assert_eq!(ChatError::NoFailedTurn.to_string(), "no failed turn to retry");
        assert_eq!(
            ChatError::ChatNotFound("abc".into()).to_string(),
            "chat not found: abc"
        );

        let err = ChatError::from(LlmError::Schema("missing field `steps`".into()));
        assert_eq!(
            err.to_string(),
            "completion failed: response does not match the answer schema: missing field `steps`"
        );
    }

    #[test]
    fn test_chat_error_from_mentor_error() {
        let err: ChatError = MentorError::Storage("disk full".into()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_chat_error_into_mentor_error() {
        let err: MentorError = ChatError::from(LlmError::Refusal("no".into())).into();
        assert!(matches!(err, MentorError::Completion(_)));

        let err: MentorError = ChatError::RequestInFlight.into();
        assert!(matches!(err, MentorError::Chat(_)));
    }
}
