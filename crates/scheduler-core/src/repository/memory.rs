//! In-memory repository for lifecycle tests and embedding.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::CoreError;
use crate::models::{NewTask, Task, TaskId};
use crate::repository::TaskRepository;

/// Thread-safe in-memory task repository.
///
/// A single lock serializes all access, so guarded writes observe the same
/// state they were checked against.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    last_id: i64,
    tasks: BTreeMap<TaskId, Task>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, CoreError> {
        self.state.lock().map_err(|_| {
            CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "in-memory repository lock poisoned",
            ))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn insert(&self, task: &NewTask) -> Result<TaskId, CoreError> {
        let mut state = self.lock()?;
        state.last_id += 1;
        let id = TaskId(state.last_id);
        state.tasks.insert(id, Task::from_new(id, task.clone()));
        Ok(id)
    }

    async fn fetch_by_id(&self, id: TaskId) -> Result<Option<Task>, CoreError> {
        Ok(self.lock()?.tasks.get(&id).cloned())
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<Task>, CoreError> {
        let state = self.lock()?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| (t.date, t.id));
        tasks.truncate(limit as usize);
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<u64, CoreError> {
        let mut state = self.lock()?;
        match state.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: TaskId) -> Result<u64, CoreError> {
        Ok(u64::from(self.lock()?.tasks.remove(&id).is_some()))
    }

    async fn reschedule(&self, task: &Task, next: NaiveDate) -> Result<u64, CoreError> {
        let mut state = self.lock()?;
        match state.tasks.get_mut(&task.id) {
            Some(stored) if stored.date == task.date && !stored.is_one_off() => {
                stored.date = next;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn delete_completed(&self, task: &Task) -> Result<u64, CoreError> {
        let mut state = self.lock()?;
        let matches = state
            .tasks
            .get(&task.id)
            .is_some_and(|stored| stored.date == task.date && stored.is_one_off());
        if matches {
            state.tasks.remove(&task.id);
        }
        Ok(u64::from(matches))
    }
}
