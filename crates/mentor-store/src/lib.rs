//! Mentor Store crate - path-addressed document persistence.
//!
//! Provides a WAL-mode SQLite database with migrations, a generic
//! collection/document store keyed by slash-separated paths, and a typed
//! repository for chats and their messages.

pub mod db;
pub mod document;
pub mod migrations;
pub mod path;
pub mod repository;

pub use db::{Database, DB_FILE};
pub use document::{Document, DocumentStore, SqliteDocumentStore};
pub use path::CollectionPath;
pub use repository::{sort_by_timestamp, ChatRepository};
