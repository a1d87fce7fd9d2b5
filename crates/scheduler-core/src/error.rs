use thiserror::Error;

use crate::recurrence::RecurrenceError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("No repeat rule given")]
    NoRule,

    #[error("Invalid repeat rule: {0}")]
    InvalidRule(String),

    #[error("Unsupported repeat rule: {0}")]
    UnsupportedRule(String),

    #[error("Task title is required")]
    MissingTitle,

    #[error("Task id is required")]
    MissingId,

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task {0} was modified concurrently")]
    Conflict(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

impl CoreError {
    /// True for failures of the storage layer rather than of the caller's input.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_)
        )
    }
}

impl From<RecurrenceError> for CoreError {
    fn from(err: RecurrenceError) -> Self {
        match err {
            RecurrenceError::InvalidDate(s) => CoreError::InvalidDate(s),
            RecurrenceError::NoRule => CoreError::NoRule,
            RecurrenceError::InvalidRule(s) => CoreError::InvalidRule(s),
            RecurrenceError::UnsupportedRule(s) => CoreError::UnsupportedRule(s),
        }
    }
}
