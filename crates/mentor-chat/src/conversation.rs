//! The tutoring transcript and the request/response cycle around it.
//!
//! A [`Conversation`] owns an append-only list of turns seeded with the
//! persona's system prompt. Each prompt becomes a user turn before any
//! network call; the whole transcript is then sent to the completion client
//! and the structured answer is shaped into an assistant [`ChatMessage`].
//! The transcript is never truncated.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use mentor_core::types::{
    now_timestamp, ChatMessage, ExplainFurtherText, Mode, Turn, TurnRole, TurnStatus,
};
use mentor_llm::{CompletionClient, StructuredAnswer, WireMessage};

use crate::error::ChatError;
use crate::persona::Persona;

/// Single-writer tutoring transcript.
#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Persona,
    turns: Vec<Turn>,
    explain_further_text: ExplainFurtherText,
    last_error: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Persona::default())
    }
}

impl Conversation {
    pub fn new(persona: Persona) -> Self {
        let turns = vec![Turn::system(persona.system_prompt())];
        Self {
            persona,
            turns,
            explain_further_text: ExplainFurtherText::default(),
            last_error: None,
        }
    }

    /// Choose which part of the answer an explain-further reply surfaces.
    pub fn with_explain_further_text(mut self, policy: ExplainFurtherText) -> Self {
        self.explain_further_text = policy;
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Message of the most recent failed request, cleared on the next send.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the newest turn is a user turn whose request failed.
    pub fn has_failed_turn(&self) -> bool {
        self.turns
            .last()
            .is_some_and(|t| t.role == TurnRole::User && t.status == TurnStatus::Failed)
    }

    /// Send one prompt and shape the reply.
    ///
    /// Returns `Ok(None)` without touching the transcript or the network when
    /// the prompt is blank. On failure the user turn stays in the transcript
    /// marked [`TurnStatus::Failed`] and no assistant turn is added.
    pub async fn send_message(
        &mut self,
        client: &dyn CompletionClient,
        prompt: &str,
        mode: Mode,
    ) -> Result<Option<ChatMessage>, ChatError> {
        self.send_user_message(client, &ChatMessage::user(prompt), mode)
            .await
    }

    /// Like [`send_message`](Self::send_message) for an already built user
    /// message. The turn keeps the message's timestamp so the transcript and
    /// the persisted copy agree.
    pub async fn send_user_message(
        &mut self,
        client: &dyn CompletionClient,
        message: &ChatMessage,
        mode: Mode,
    ) -> Result<Option<ChatMessage>, ChatError> {
        let prompt = message.text.trim();
        if prompt.is_empty() {
            return Ok(None);
        }

        self.turns.push(Turn {
            role: TurnRole::User,
            content: prompt.to_string(),
            timestamp: message.timestamp.clone().or_else(|| Some(now_timestamp())),
            status: TurnStatus::Pending,
        });

        self.dispatch(client, mode).await.map(Some)
    }

    /// Re-send the trailing failed user turn without appending a new one.
    pub async fn retry_failed(
        &mut self,
        client: &dyn CompletionClient,
        mode: Mode,
    ) -> Result<ChatMessage, ChatError> {
        let turn = match self.turns.last_mut() {
            Some(t) if t.role == TurnRole::User && t.status == TurnStatus::Failed => t,
            _ => return Err(ChatError::NoFailedTurn),
        };
        turn.status = TurnStatus::Pending;
        tracing::info!("Retrying failed turn");
        self.dispatch(client, mode).await
    }

    /// Drop the trailing failed user turn, returning it.
    pub fn discard_failed(&mut self) -> Option<Turn> {
        if !self.has_failed_turn() {
            return None;
        }
        self.last_error = None;
        self.turns.pop()
    }

    /// Rebuild the transcript from persisted messages.
    ///
    /// Messages are ordered by timestamp. A user message with no reply after
    /// it is marked failed so it can be retried.
    pub fn restore(&mut self, messages: &[ChatMessage]) {
        let mut sorted = messages.to_vec();
        mentor_store::sort_by_timestamp(&mut sorted);

        self.turns.truncate(1);
        self.last_error = None;
        for message in sorted {
            self.turns.push(Turn {
                role: TurnRole::from(message.role),
                content: message.text,
                timestamp: message.timestamp,
                status: TurnStatus::Answered,
            });
        }

        let len = self.turns.len();
        for i in 1..len {
            let answered = self
                .turns
                .get(i + 1)
                .is_some_and(|next| next.role == TurnRole::Assistant);
            let turn = &mut self.turns[i];
            if turn.role == TurnRole::User && !answered {
                turn.status = TurnStatus::Failed;
            }
        }

        tracing::debug!(turns = self.turns.len(), "Transcript restored");
    }

    /// One-off free-text completion outside the transcript.
    pub async fn complete_text(
        &self,
        client: &dyn CompletionClient,
        prompt: &str,
    ) -> Result<Option<String>, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(None);
        }
        let reply = client
            .complete_text(&[WireMessage::new(TurnRole::User, prompt)])
            .await?;
        Ok(Some(reply))
    }

    async fn dispatch(
        &mut self,
        client: &dyn CompletionClient,
        mode: Mode,
    ) -> Result<ChatMessage, ChatError> {
        self.last_error = None;
        let messages: Vec<WireMessage> = self.turns.iter().map(WireMessage::from).collect();

        tracing::debug!(turns = messages.len(), ?mode, "Requesting structured answer");

        match client.complete_structured(&messages).await {
            Ok(answer) => {
                self.mark_pending(TurnStatus::Answered);
                let message = self.shape(answer, mode);
                self.turns.push(Turn {
                    role: TurnRole::Assistant,
                    content: message.text.clone(),
                    timestamp: message.timestamp.clone(),
                    status: TurnStatus::Answered,
                });
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Completion request failed");
                self.mark_pending(TurnStatus::Failed);
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn mark_pending(&mut self, status: TurnStatus) {
        if let Some(turn) = self
            .turns
            .iter_mut()
            .rev()
            .find(|t| t.status == TurnStatus::Pending)
        {
            turn.status = status;
        }
    }

    fn shape(&self, answer: StructuredAnswer, mode: Mode) -> ChatMessage {
        let text = match (mode, self.explain_further_text) {
            (Mode::ExplainFurther, ExplainFurtherText::FirstStep) => answer
                .steps
                .first()
                .map(|step| step.explanation.clone())
                .unwrap_or_else(|| answer.final_answer.clone()),
            _ => answer.final_answer.clone(),
        };
        ChatMessage::ai(text, answer.steps)
    }
}

/// Shared access to a [`Conversation`] that refuses overlapping requests.
#[derive(Debug, Clone, Default)]
pub struct ConversationHandle {
    inner: Arc<Mutex<Conversation>>,
}

impl ConversationHandle {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conversation)),
        }
    }

    /// Fails with [`ChatError::RequestInFlight`] while another call is running.
    pub async fn send_message(
        &self,
        client: &dyn CompletionClient,
        prompt: &str,
        mode: Mode,
    ) -> Result<Option<ChatMessage>, ChatError> {
        let mut conversation = self.try_lock()?;
        conversation.send_message(client, prompt, mode).await
    }

    pub async fn retry_failed(
        &self,
        client: &dyn CompletionClient,
        mode: Mode,
    ) -> Result<ChatMessage, ChatError> {
        let mut conversation = self.try_lock()?;
        conversation.retry_failed(client, mode).await
    }

    pub fn discard_failed(&self) -> Result<Option<Turn>, ChatError> {
        Ok(self.try_lock()?.discard_failed())
    }

    pub fn restore(&self, messages: &[ChatMessage]) -> Result<(), ChatError> {
        self.try_lock()?.restore(messages);
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// Exclusive access for a multi-step exchange. Fails with
    /// [`ChatError::RequestInFlight`] instead of waiting.
    pub fn acquire(&self) -> Result<MutexGuard<'_, Conversation>, ChatError> {
        self.try_lock()
    }

    /// Copy of the transcript, waiting for any in-flight request.
    pub async fn turns(&self) -> Vec<Turn> {
        self.inner.lock().await.turns().to_vec()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.last_error().map(str::to_string)
    }

    fn try_lock(&self) -> Result<MutexGuard<'_, Conversation>, ChatError> {
        self.inner.try_lock().map_err(|_| ChatError::RequestInFlight)
    }
}
