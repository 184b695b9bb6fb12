//! SQLite handle shared by the document store.
//!
//! One connection behind a mutex; file databases run in WAL mode. Migrations
//! are applied every time a handle is opened.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use mentor_core::error::MentorError;

use crate::migrations;

/// File name used when opening a database inside a data directory.
pub const DB_FILE: &str = "mentor.db";

pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file, creating parent directories.
    pub fn new(path: &Path) -> Result<Self, MentorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| storage("open database", e))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| storage("configure database", e))?;

        let db = Self::from_connection(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Document database ready");
        Ok(db)
    }

    /// Open `DB_FILE` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> Result<Self, MentorError> {
        Self::new(&data_dir.join(DB_FILE))
    }

    /// Throwaway database for tests and dry runs.
    pub fn in_memory() -> Result<Self, MentorError> {
        let conn = Connection::open_in_memory().map_err(|e| storage("open in-memory database", e))?;
        Self::from_connection(conn, None)
    }

    /// Backing file, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MentorError>
    where
        F: FnOnce(&Connection) -> Result<T, MentorError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MentorError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self, MentorError> {
        let db = Self {
            conn: Mutex::new(conn),
            path,
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

pub(crate) fn storage(action: &str, err: rusqlite::Error) -> MentorError {
    MentorError::Storage(format!("Failed to {}: {}", action, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_documents(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                .map_err(|e| MentorError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_documents(&db), 0);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mentor.db");
        let db = Database::new(&path).unwrap();
        assert_eq!(count_documents(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_wal_mode_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("wal.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(|e| MentorError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_open_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in(dir.path()).unwrap();
        assert_eq!(db.path(), Some(dir.path().join(DB_FILE).as_path()));
        assert!(Database::in_memory().unwrap().path().is_none());
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mentor.db");
        drop(Database::new(&path).unwrap());
        let db = Database::new(&path).unwrap();
        assert_eq!(count_documents(&db), 0);
    }
}
