//! Generic document store: opaque JSON objects grouped into path-addressed
//! collections, with store-assigned ids.

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use mentor_core::error::MentorError;

use crate::db::{storage, Database};
use crate::path::CollectionPath;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// The document as a single JSON object with `id` merged in.
    pub fn into_value(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Value::Object(data)
    }
}

/// Create/read access to a collection-oriented document database.
///
/// Returned documents come back in insertion order, but callers must not rely
/// on it; hosted stores make no such promise.
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection.
    fn get_collection(&self, path: &CollectionPath) -> Result<Vec<Document>, MentorError>;

    /// Add a document and return its newly assigned id.
    fn add_document(&self, path: &CollectionPath, data: Value) -> Result<String, MentorError>;
}

/// [`DocumentStore`] backed by the SQLite `documents` table.
pub struct SqliteDocumentStore {
    db: Arc<Database>,
}

impl SqliteDocumentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get_collection(&self, path: &CollectionPath) -> Result<Vec<Document>, MentorError> {
        let collection = path.as_string();
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY seq")
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![collection], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            let mut documents = Vec::new();
            for row in rows {
                let (id, raw) = row.map_err(|e| MentorError::Storage(e.to_string()))?;
                let data = match serde_json::from_str::<Value>(&raw)? {
                    Value::Object(map) => map,
                    other => {
                        return Err(MentorError::Storage(format!(
                            "document {} holds a non-object value: {}",
                            id, other
                        )))
                    }
                };
                documents.push(Document { id, data });
            }
            Ok(documents)
        })
    }

    fn add_document(&self, path: &CollectionPath, data: Value) -> Result<String, MentorError> {
        if !data.is_object() {
            return Err(MentorError::Storage(
                "documents must be JSON objects".to_string(),
            ));
        }
        let id = Uuid::new_v4().to_string();
        let collection = path.as_string();
        let raw = serde_json::to_string(&data)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, collection, data) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, collection, raw],
            )
            .map_err(|e| storage("add document", e))?;
            Ok(())
        })?;

        tracing::debug!(collection = %path, id = %id, "Document added");
        Ok(id)
    }
}
