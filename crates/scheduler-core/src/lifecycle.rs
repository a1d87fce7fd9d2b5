//! Task lifecycle: write-time date normalization and completion.
//!
//! The pure functions [`prepare_for_insert`], [`prepare_for_update`] and
//! [`complete`] decide what should be stored. [`TaskLifecycle`] wraps them
//! around an injected [`TaskRepository`] and applies the decisions.
//!
//! A task's stored date is never left in the past by a write:
//!
//! - a past one-off date is moved to today
//! - a past repeating date is moved to its next occurrence on or after today
//! - today and future dates are stored as given

use chrono::NaiveDate;
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::{CompletionResult, NewTask, RepeatRule, Task, TaskId, TaskInput};
use crate::recurrence::{parse_date, RecurrenceError};
use crate::repository::TaskRepository;

/// Validates and normalizes a task before its first insertion.
///
/// # Errors
/// * [`CoreError::MissingTitle`] if the title is blank
/// * [`CoreError::InvalidDate`] if a non-empty date is not `YYYYMMDD`
/// * [`CoreError::InvalidRule`] if the repeat rule does not parse or cannot
///   be resolved
pub fn prepare_for_insert(input: TaskInput, today: NaiveDate) -> Result<NewTask, CoreError> {
    let TaskInput {
        date,
        title,
        comment,
        repeat,
        ..
    } = input;

    let title = require_title(title)?;
    let date = date_or_today(&date, today)?;
    let repeat = parse_rule(&repeat)?;

    let date = if date == today {
        today
    } else if date < today {
        catch_up(date, repeat, today)?
    } else {
        date
    };

    Ok(NewTask {
        date,
        title,
        comment,
        repeat,
    })
}

/// Validates and normalizes a full replacement of an existing task.
///
/// Only a date strictly before `today` is changed; today and future dates
/// pass through untouched.
///
/// # Errors
/// * [`CoreError::MissingId`] if the id is empty
/// * [`CoreError::NotFound`] if the id is not a task id at all
/// * otherwise as [`prepare_for_insert`]
pub fn prepare_for_update(input: TaskInput, today: NaiveDate) -> Result<Task, CoreError> {
    let TaskInput {
        id,
        date,
        title,
        comment,
        repeat,
    } = input;

    let id = parse_id(&id)?;
    let title = require_title(title)?;
    let date = date_or_today(&date, today)?;
    let repeat = parse_rule(&repeat)?;

    let date = if date < today {
        catch_up(date, repeat, today)?
    } else {
        date
    };

    Ok(Task {
        id,
        date,
        title,
        comment,
        repeat,
    })
}

/// Decides what completing `task` means: one-off tasks are deleted, repeating
/// tasks move to their first occurrence strictly after `today`.
///
/// A repeating task completed on its due day therefore always gets a new
/// date, which is what the guarded write in [`TaskLifecycle::complete_task`]
/// compares against.
pub fn complete(task: &Task, today: NaiveDate) -> Result<CompletionResult, CoreError> {
    match task.repeat {
        None => Ok(CompletionResult::Deleted),
        Some(rule) => rule
            .next_after_day(today, task.date)
            .map(CompletionResult::Rescheduled)
            .map_err(rule_error),
    }
}

/// Parses a caller-supplied task id.
pub fn parse_id(raw: &str) -> Result<TaskId, CoreError> {
    if raw.is_empty() {
        return Err(CoreError::MissingId);
    }
    raw.parse()
        .map_err(|_| CoreError::NotFound(raw.to_string()))
}

fn require_title(title: String) -> Result<String, CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::MissingTitle);
    }
    Ok(title)
}

fn date_or_today(raw: &str, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    if raw.is_empty() {
        return Ok(today);
    }
    Ok(parse_date(raw)?)
}

fn parse_rule(raw: &str) -> Result<Option<RepeatRule>, CoreError> {
    RepeatRule::parse(raw).map_err(rule_error)
}

fn catch_up(
    date: NaiveDate,
    repeat: Option<RepeatRule>,
    today: NaiveDate,
) -> Result<NaiveDate, CoreError> {
    match repeat {
        None => Ok(today),
        Some(rule) => rule.next_after(today, date).map_err(rule_error),
    }
}

fn rule_error(err: RecurrenceError) -> CoreError {
    CoreError::InvalidRule(err.to_string())
}

/// Task operations over an injected repository.
pub struct TaskLifecycle<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> Clone for TaskLifecycle<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: TaskRepository> TaskLifecycle<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn add_task(&self, input: TaskInput, today: NaiveDate) -> Result<TaskId, CoreError> {
        let task = prepare_for_insert(input, today)?;
        let id = self.repository.insert(&task).await?;
        tracing::info!(%id, date = %task.date, "task created");
        Ok(id)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, CoreError> {
        let id = parse_id(id)?;
        self.repository
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    pub async fn list_tasks(&self, limit: u32) -> Result<Vec<Task>, CoreError> {
        self.repository.fetch_all(limit).await
    }

    pub async fn update_task(&self, input: TaskInput, today: NaiveDate) -> Result<(), CoreError> {
        let task = prepare_for_update(input, today)?;
        if self.repository.update(&task).await? == 0 {
            return Err(CoreError::NotFound(task.id.to_string()));
        }
        tracing::info!(id = %task.id, date = %task.date, "task updated");
        Ok(())
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), CoreError> {
        let id = parse_id(id)?;
        if self.repository.delete(id).await? == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        tracing::info!(%id, "task deleted");
        Ok(())
    }

    /// Completes a task: deletes it if one-off, otherwise advances its date.
    ///
    /// The write is guarded on the state that was read, so of two racing
    /// completions only one is applied. The loser gets
    /// [`CoreError::NotFound`] if the task is gone, [`CoreError::Conflict`]
    /// if it was changed.
    pub async fn complete_task(
        &self,
        id: &str,
        today: NaiveDate,
    ) -> Result<CompletionResult, CoreError> {
        let id = parse_id(id)?;
        let task = self
            .repository
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let outcome = complete(&task, today)?;
        tracing::debug!(%id, state = ?task.state(today), ?outcome, "completion decided");

        let affected = match outcome {
            CompletionResult::Deleted => self.repository.delete_completed(&task).await?,
            CompletionResult::Rescheduled(next) => self.repository.reschedule(&task, next).await?,
        };

        if affected == 0 {
            return match self.repository.fetch_by_id(id).await? {
                None => Err(CoreError::NotFound(id.to_string())),
                Some(_) => Err(CoreError::Conflict(id.to_string())),
            };
        }

        tracing::info!(%id, ?outcome, "task completed");
        Ok(outcome)
    }
}
