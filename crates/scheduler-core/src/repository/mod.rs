use crate::error::CoreError;
use crate::models::{NewTask, RepeatRule, Task, TaskId};
use crate::recurrence::{parse_date, RecurrenceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

/// Persistence contract for tasks.
///
/// Write operations report the number of affected rows; interpreting zero as
/// "not found" or "conflict" is left to the caller.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: &NewTask) -> Result<TaskId, CoreError>;

    /// Fails with [`CoreError::UnsupportedRule`] if the stored rule no longer parses.
    async fn fetch_by_id(&self, id: TaskId) -> Result<Option<Task>, CoreError>;

    /// Returns up to `limit` tasks ordered by date ascending. Stored rows that
    /// cannot be decoded are left out.
    async fn fetch_all(&self, limit: u32) -> Result<Vec<Task>, CoreError>;

    /// Replaces every field of the stored task with the same id.
    async fn update(&self, task: &Task) -> Result<u64, CoreError>;

    async fn delete(&self, id: TaskId) -> Result<u64, CoreError>;

    /// Moves a repeating task to `next`, provided the stored row still has
    /// `task.date` and still repeats.
    async fn reschedule(&self, task: &Task, next: NaiveDate) -> Result<u64, CoreError>;

    /// Deletes a completed one-off task, provided the stored row still has
    /// `task.date` and still has no repeat rule.
    async fn delete_completed(&self, task: &Task) -> Result<u64, CoreError>;
}

/// Raw row of the `scheduler` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = CoreError;

    /// A stored rule that no longer parses is reported as unsupported.
    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date)?;
        let repeat: Option<RepeatRule> = RepeatRule::parse(&row.repeat).map_err(|e| match e {
            RecurrenceError::InvalidRule(_) | RecurrenceError::UnsupportedRule(_) => {
                CoreError::UnsupportedRule(row.repeat.clone())
            }
            other => other.into(),
        })?;

        Ok(Task {
            id: TaskId(row.id),
            date,
            title: row.title,
            comment: row.comment,
            repeat,
        })
    }
}
