use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

pub use crate::recurrence::RepeatRule;
use crate::recurrence::format_date;

/// Default page size for task listings.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Storage-assigned task identifier. Rendered as a decimal string on the wire.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(#[serde_as(as = "DisplayFromStr")] pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(TaskId)
    }
}

/// Raw task fields as supplied by a caller, before validation.
///
/// Every field defaults to the empty string so that partially filled request
/// bodies deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskInput {
    pub id: String,
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

/// A validated task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub date: NaiveDate,
    pub title: String,
    pub comment: String,
    pub repeat: Option<RepeatRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    /// Next (or current) due date.
    pub date: NaiveDate,
    pub title: String,
    pub comment: String,
    /// `None` for one-off tasks.
    pub repeat: Option<RepeatRule>,
}

impl Task {
    pub fn from_new(id: TaskId, task: NewTask) -> Self {
        Self {
            id,
            date: task.date,
            title: task.title,
            comment: task.comment,
            repeat: task.repeat,
        }
    }

    pub fn is_one_off(&self) -> bool {
        self.repeat.is_none()
    }

    /// Derives the task's transient state relative to `today`.
    pub fn state(&self, today: NaiveDate) -> TaskState {
        if self.date < today {
            TaskState::Overdue
        } else {
            TaskState::Pending
        }
    }

    /// The stored rule in its canonical string form, empty for one-off tasks.
    pub fn repeat_string(&self) -> String {
        repeat_to_string(self.repeat)
    }

    pub fn date_string(&self) -> String {
        format_date(self.date)
    }
}

pub(crate) fn repeat_to_string(repeat: Option<RepeatRule>) -> String {
    repeat.map(|rule| rule.to_string()).unwrap_or_default()
}

/// State of a task derived from its date. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Due today or in the future.
    Pending,
    /// Past due and not yet normalized by a write.
    Overdue,
}

/// Outcome of completing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionResult {
    /// One-off task, removed from storage.
    Deleted,
    /// Repeating task, moved to the given date.
    Rescheduled(NaiveDate),
}
