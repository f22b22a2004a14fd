//! Repository Module
//!
//! Function-style CRUD over the SQLite tables; one module per table.

pub mod access;
pub mod client;
pub mod journal;
pub mod journal_day;
pub mod order;
pub mod payment;
pub mod service;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Store busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let msg = db.message();
                if msg.contains("UNIQUE constraint failed") {
                    RepoError::Duplicate(msg.to_string())
                } else if msg.contains("database is locked") || msg.contains("database table is locked") {
                    RepoError::Busy(msg.to_string())
                } else {
                    RepoError::Database(msg.to_string())
                }
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl RepoError {
    /// Conflict-type store aborts that are worth a bounded retry
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Busy(_))
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
