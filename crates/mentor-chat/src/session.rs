//! A persisted chat: store, conversation and illustrations wired together.

use std::sync::Arc;

use mentor_core::types::{Chat, ChatMessage, Mode};
use mentor_image::{ImageLookup, ImageSize};
use mentor_llm::CompletionClient;
use mentor_store::ChatRepository;

use crate::conversation::{Conversation, ConversationHandle};
use crate::error::ChatError;

/// One open chat.
///
/// Submitting a prompt persists the user message, asks the conversation for
/// an answer, looks up an illustration for the prompt and persists the reply
/// with the image URL attached.
pub struct ChatSession {
    chat: Chat,
    repository: ChatRepository,
    conversation: ConversationHandle,
    client: Arc<dyn CompletionClient>,
    images: Option<Arc<dyn ImageLookup>>,
    image_size: ImageSize,
}

impl ChatSession {
    /// Open an existing chat and restore its transcript into `conversation`.
    pub fn open(
        repository: ChatRepository,
        client: Arc<dyn CompletionClient>,
        chat_id: &str,
        mut conversation: Conversation,
    ) -> Result<Self, ChatError> {
        let chat = repository
            .find_chat(chat_id)?
            .ok_or_else(|| ChatError::ChatNotFound(chat_id.to_string()))?;

        let messages = repository.list_messages(chat_id)?;
        conversation.restore(&messages);
        tracing::info!(chat_id = %chat.chat_id, messages = messages.len(), "Opened chat");

        Ok(Self {
            chat,
            repository,
            conversation: ConversationHandle::new(conversation),
            client,
            images: None,
            image_size: ImageSize::default(),
        })
    }

    /// Attach an illustration source for replies.
    pub fn with_images(mut self, images: Arc<dyn ImageLookup>, size: ImageSize) -> Self {
        self.images = Some(images);
        self.image_size = size;
        self
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    pub fn conversation(&self) -> &ConversationHandle {
        &self.conversation
    }

    /// Persisted messages, oldest first.
    pub fn messages(&self) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.repository.list_messages(&self.chat.chat_id)?)
    }

    /// Send a prompt and persist both sides of the exchange.
    ///
    /// A blank prompt is a no-op. When the completion fails the user message
    /// stays persisted and the error is returned. The conversation stays
    /// locked from before the user message is stored until the reply is, so
    /// an overlapping call fails with [`ChatError::RequestInFlight`] and
    /// stores nothing.
    pub async fn submit(&self, prompt: &str, mode: Mode) -> Result<Option<ChatMessage>, ChatError> {
        let text = prompt.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let mut conversation = self.conversation.acquire()?;

        let user = ChatMessage::user(text);
        self.repository.add_message(&self.chat.chat_id, &user)?;

        let reply = match conversation
            .send_user_message(self.client.as_ref(), &user, mode)
            .await?
        {
            Some(reply) => reply,
            None => return Ok(None),
        };

        self.finish(text, reply).await.map(Some)
    }

    /// Re-send the trailing failed prompt and persist the reply.
    pub async fn retry(&self, mode: Mode) -> Result<ChatMessage, ChatError> {
        let mut conversation = self.conversation.acquire()?;
        let prompt = conversation
            .turns()
            .last()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let reply = conversation
            .retry_failed(self.client.as_ref(), mode)
            .await?;
        self.finish(&prompt, reply).await
    }

    /// Drop the trailing failed prompt from the transcript.
    ///
    /// The persisted user message is kept; reopening the chat marks it failed
    /// again.
    pub fn discard_failed(&self) -> Result<Option<String>, ChatError> {
        Ok(self
            .conversation
            .discard_failed()?
            .map(|turn| turn.content))
    }

    async fn finish(&self, prompt: &str, mut reply: ChatMessage) -> Result<ChatMessage, ChatError> {
        if let Some(images) = &self.images {
            reply.image_url = images.fetch_image(prompt, self.image_size).await;
        }
        self.repository.add_message(&self.chat.chat_id, &reply)?;
        tracing::debug!(
            chat_id = %self.chat.chat_id,
            illustrated = reply.image_url.is_some(),
            "Reply stored"
        );
        Ok(reply)
    }
}
