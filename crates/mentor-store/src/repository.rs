//! Typed access to chats (`chats`) and their messages
//! (`chats/{chatId}/messages`).

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use mentor_core::error::MentorError;
use mentor_core::types::{now_timestamp, parse_timestamp, Chat, ChatMessage};

use crate::document::DocumentStore;
use crate::path::CollectionPath;

const CHATS: &str = "chats";
const MESSAGES: &str = "messages";

/// Repository for chat threads and their messages.
#[derive(Clone)]
pub struct ChatRepository {
    store: Arc<dyn DocumentStore>,
}

impl ChatRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Start a new chat thread with a random chat id.
    pub fn create_chat(&self, title: Option<&str>) -> Result<Chat, MentorError> {
        let chat_id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();

        let mut data = json!({
            "chatId": chat_id,
            "createdAt": created_at,
        });
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            data["title"] = Value::String(title.to_string());
        }

        let id = self.store.add_document(&chats_path()?, data)?;
        info!(chat_id = %chat_id, "Chat created");

        Ok(Chat {
            id,
            chat_id,
            created_at,
            title: title.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    /// All chats, oldest first. Malformed documents are skipped.
    pub fn list_chats(&self) -> Result<Vec<Chat>, MentorError> {
        let mut chats: Vec<Chat> = self
            .store
            .get_collection(&chats_path()?)?
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match serde_json::from_value::<Chat>(doc.into_value()) {
                    Ok(chat) => Some(chat),
                    Err(e) => {
                        warn!(id = %id, error = %e, "Skipping malformed chat document");
                        None
                    }
                }
            })
            .collect();

        chats.sort_by(|a, b| {
            compare_optional_times(parse_timestamp(&a.created_at), parse_timestamp(&b.created_at))
        });
        Ok(chats)
    }

    /// Look up a chat by its client-generated chat id.
    ///
    /// Scans the collection once and decodes only the matching document.
    pub fn find_chat(&self, chat_id: &str) -> Result<Option<Chat>, MentorError> {
        let doc = self
            .store
            .get_collection(&chats_path()?)?
            .into_iter()
            .find(|doc| doc.data.get("chatId").and_then(Value::as_str) == Some(chat_id));

        match doc {
            Some(doc) => Ok(serde_json::from_value(doc.into_value()).ok()),
            None => Ok(None),
        }
    }

    /// Append a message to a chat. The chat must exist.
    pub fn add_message(&self, chat_id: &str, message: &ChatMessage) -> Result<String, MentorError> {
        if chat_id.trim().is_empty() {
            return Err(MentorError::Storage(
                "messages require a parent chat id".to_string(),
            ));
        }
        if self.find_chat(chat_id)?.is_none() {
            return Err(MentorError::Storage(format!("chat not found: {}", chat_id)));
        }

        let data = serde_json::to_value(message)?;
        self.store.add_document(&messages_path(chat_id)?, data)
    }

    /// Messages of a chat, sorted ascending by timestamp.
    pub fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, MentorError> {
        let mut messages: Vec<ChatMessage> = self
            .store
            .get_collection(&messages_path(chat_id)?)?
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match serde_json::from_value::<ChatMessage>(doc.into_value()) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        warn!(id = %id, error = %e, "Skipping malformed message document");
                        None
                    }
                }
            })
            .collect();

        sort_by_timestamp(&mut messages);
        Ok(messages)
    }
}

/// Sort messages ascending by parsed timestamp.
///
/// The sort is stable; messages whose timestamp is missing or unparseable keep
/// their relative order and come before all timestamped ones.
pub fn sort_by_timestamp(messages: &mut [ChatMessage]) {
    messages.sort_by(|a, b| compare_optional_times(a.parsed_timestamp(), b.parsed_timestamp()));
}

fn compare_optional_times<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn chats_path() -> Result<CollectionPath, MentorError> {
    CollectionPath::root(CHATS)
}

fn messages_path(chat_id: &str) -> Result<CollectionPath, MentorError> {
    chats_path()?.subcollection(chat_id, MESSAGES)
}
