//! Mentor LLM crate - completion provider access.
//!
//! Defines the [`CompletionClient`] seam used by the conversation
//! orchestrator, the fixed answer schema every structured request is
//! constrained by, an OpenAI-compatible HTTP implementation, and a scripted
//! mock for tests.

pub mod client;
pub mod error;
pub mod mock;
pub mod openai;
pub mod schema;

pub use client::{CompletionClient, WireMessage};
pub use error::LlmError;
pub use mock::MockCompletionClient;
pub use openai::OpenAiClient;
pub use schema::{answer_schema, parse_structured, StructuredAnswer};
