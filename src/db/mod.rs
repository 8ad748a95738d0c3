pub mod repository;
pub mod sqlite;

pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Malformed stored value for {field}: {reason}")]
    MalformedValue { field: String, reason: String },

    #[error("Revision conflict: expected {expected}, found {found}")]
    RevisionConflict { expected: i64, found: i64 },
}

impl DatabaseError {
    /// Classify a rusqlite error as a unique-index violation.
    /// The schema relies on UNIQUE constraints (e.g. attendance staff+date)
    /// to reject duplicate inserts.
    pub fn from_insert(err: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if e.code == rusqlite::ErrorCode::ConstraintViolation {
                return DatabaseError::Duplicate(what.to_string());
            }
        }
        DatabaseError::Sqlite(err)
    }
}
