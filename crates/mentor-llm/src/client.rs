use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mentor_core::types::{Turn, TurnRole};

use crate::error::LlmError;
use crate::schema::StructuredAnswer;

/// A role-tagged message as sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: TurnRole,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Access to a hosted chat-completion model.
///
/// Every call is stateless: the full context travels with each request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Free-text completion; the reply is trimmed.
    async fn complete_text(&self, messages: &[WireMessage]) -> Result<String, LlmError>;

    /// Completion constrained to the answer schema.
    async fn complete_structured(
        &self,
        messages: &[WireMessage],
    ) -> Result<StructuredAnswer, LlmError>;
}
