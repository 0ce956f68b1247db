use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Routine not found: {0}")]
    UnknownRoutine(String),

    #[error("Routine '{0}' returned no rows")]
    NoRows(String),

    #[error("Workflow {id} is {reason}")]
    WorkflowUnavailable { id: i64, reason: &'static str },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Timed out after {0:?} waiting for the database connection")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
