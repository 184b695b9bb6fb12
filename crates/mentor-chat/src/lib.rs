//! Conversational tutoring for Mentor.
//!
//! Holds the persona-seeded transcript, turns prompts into structured
//! answers through a completion client, and ties persisted chats, replies
//! and illustrations together in a [`ChatSession`].

pub mod conversation;
pub mod error;
pub mod persona;
pub mod session;

pub use conversation::{Conversation, ConversationHandle};
pub use error::ChatError;
pub use persona::Persona;
pub use session::ChatSession;
