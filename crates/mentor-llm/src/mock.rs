//! Scripted completion client for tests and offline development.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{CompletionClient, WireMessage};
use crate::error::LlmError;
use crate::schema::{parse_structured, StructuredAnswer};

enum Scripted {
    Content(String),
    Failure(String),
}

/// Mock client that replays queued responses in order and records every
/// request it receives.
///
/// Structured calls parse the queued content with the real schema parser, so
/// malformed payloads fail the same way they would against a live provider.
#[derive(Default)]
pub struct MockCompletionClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Vec<WireMessage>>>,
    delay: Option<Duration>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue raw message content.
    pub fn push_content(&self, content: impl Into<String>) {
        self.lock_script().push_back(Scripted::Content(content.into()));
    }

    /// Queue a well-formed structured answer.
    pub fn push_answer(&self, answer: &StructuredAnswer) {
        let content = serde_json::to_string(answer).unwrap_or_default();
        self.push_content(content);
    }

    /// Queue a provider failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_script().push_back(Scripted::Failure(message.into()));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<WireMessage>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, messages: &[WireMessage]) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
    }

    fn pop(&self) -> Option<Scripted> {
        self.lock_script().pop_front()
    }

    async fn next(&self, messages: &[WireMessage]) -> Result<String, LlmError> {
        self.record(messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.pop() {
            Some(Scripted::Content(content)) => Ok(content),
            Some(Scripted::Failure(message)) => Err(LlmError::Api {
                status: 500,
                body: message,
            }),
            None => Err(LlmError::InvalidResponse(
                "no scripted response left".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete_text(&self, messages: &[WireMessage]) -> Result<String, LlmError> {
        Ok(self.next(messages).await?.trim().to_string())
    }

    async fn complete_structured(
        &self,
        messages: &[WireMessage],
    ) -> Result<StructuredAnswer, LlmError> {
        let content = self.next(messages).await?;
        parse_structured(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::types::{BulletPoint, TurnRole};

    fn answer() -> StructuredAnswer {
        StructuredAnswer {
            steps: vec![BulletPoint {
                heading: "Step 1".into(),
                explanation: "e1".into(),
                output: "o1".into(),
            }],
            final_answer: "A".into(),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let mock = MockCompletionClient::new();
        mock.push_answer(&answer());
        mock.push_content(" plain ");

        let msgs = vec![WireMessage::new(TurnRole::User, "q")];
        assert_eq!(mock.complete_structured(&msgs).await.unwrap(), answer());
        assert_eq!(mock.complete_text(&msgs).await.unwrap(), "plain");
        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[0], msgs);
    }

    #[tokio::test]
    async fn test_failure_and_exhaustion() {
        let mock = MockCompletionClient::new();
        mock.push_failure("boom");
        let msgs = vec![WireMessage::new(TurnRole::User, "q")];

        assert!(matches!(
            mock.complete_text(&msgs).await,
            Err(LlmError::Api { status: 500, .. })
        ));
        assert!(matches!(
            mock.complete_text(&msgs).await,
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_structured_content() {
        let mock = MockCompletionClient::new();
        mock.push_content("{\"final_answer\": \"A\"}");
        let err = mock
            .complete_structured(&[WireMessage::new(TurnRole::User, "q")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
    }
}
