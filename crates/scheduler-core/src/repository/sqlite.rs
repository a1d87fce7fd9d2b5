use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{repeat_to_string, NewTask, Task, TaskId};
use crate::recurrence::format_date;
use crate::repository::{TaskRepository, TaskRow};
use async_trait::async_trait;
use chrono::NaiveDate;

const SELECT_TASK: &str = "SELECT id, date, title, comment, repeat FROM scheduler";

/// SQLite implementation of [`TaskRepository`].
///
/// Every method is a single statement, so each write is atomic. The guarded
/// writes used by completion compare the stored date in the same statement.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for SqliteRepository {
    async fn insert(&self, task: &NewTask) -> Result<TaskId, CoreError> {
        let result = sqlx::query(
            "INSERT INTO scheduler (date, title, comment, repeat) VALUES ($1, $2, $3, $4)",
        )
        .bind(format_date(task.date))
        .bind(&task.title)
        .bind(&task.comment)
        .bind(repeat_to_string(task.repeat))
        .execute(&self.pool)
        .await?;

        Ok(TaskId(result.last_insert_rowid()))
    }

    async fn fetch_by_id(&self, id: TaskId) -> Result<Option<Task>, CoreError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_TASK))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    async fn fetch_all(&self, limit: u32) -> Result<Vec<Task>, CoreError> {
        let rows: Vec<TaskRow> =
            sqlx::query_as(&format!("{} ORDER BY date, id LIMIT $1", SELECT_TASK))
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?;

        // One undecodable row must not hide the rest of the listing.
        let tasks = rows
            .into_iter()
            .filter_map(|row| {
                let (id, repeat) = (row.id, row.repeat.clone());
                match Task::try_from(row) {
                    Ok(task) => Some(task),
                    Err(e) => {
                        tracing::warn!(id, repeat = %repeat, error = %e, "skipping undecodable task row");
                        None
                    }
                }
            })
            .collect();
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "UPDATE scheduler SET date = $1, title = $2, comment = $3, repeat = $4 WHERE id = $5",
        )
        .bind(task.date_string())
        .bind(&task.title)
        .bind(&task.comment)
        .bind(task.repeat_string())
        .bind(task.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: TaskId) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM scheduler WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn reschedule(&self, task: &Task, next: NaiveDate) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "UPDATE scheduler SET date = $1 WHERE id = $2 AND date = $3 AND repeat <> ''",
        )
        .bind(format_date(next))
        .bind(task.id.0)
        .bind(task.date_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_completed(&self, task: &Task) -> Result<u64, CoreError> {
        let result =
            sqlx::query("DELETE FROM scheduler WHERE id = $1 AND date = $2 AND repeat = ''")
                .bind(task.id.0)
                .bind(task.date_string())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
