use super::error::ApiError;
use super::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use scheduler_core::models::{Task, TaskId, TaskInput};
use scheduler_core::recurrence::{parse_date, resolve};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NextDateQuery {
    pub now: String,
    pub date: String,
    pub repeat: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdQuery {
    pub id: String,
}

/// Wire form of a stored task. Dates are `YYYYMMDD`, a missing rule is `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub date: String,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            date: task.date_string(),
            repeat: task.repeat_string(),
            title: task.title,
            comment: task.comment,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: TaskId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskResponse>,
}

pub async fn next_date(Query(query): Query<NextDateQuery>) -> Result<String, ApiError> {
    if query.now.is_empty() || query.date.is_empty() || query.repeat.is_empty() {
        return Err(ApiError::BadRequest(
            "now, date and repeat are required".to_string(),
        ));
    }
    let now = parse_date(&query.now)
        .map_err(|_| ApiError::BadRequest(format!("invalid now: {}", query.now)))?;

    let next = resolve(now, &query.date, &query.repeat)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(next)
}

pub async fn add_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<IdResponse>, ApiError> {
    let Json(input) = payload?;
    let id = state.lifecycle.add_task(input, state.today()?).await?;
    Ok(Json(IdResponse { id }))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.lifecycle.get_task(&query.id).await?;
    Ok(Json(task.into()))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    state.lifecycle.update_task(input, state.today()?).await?;
    Ok(Json(json!({})))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    state.lifecycle.delete_task(&query.id).await?;
    Ok(Json(json!({})))
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TasksResponse>, ApiError> {
    let tasks = state.lifecycle.list_tasks(state.page_size).await?;
    Ok(Json(TasksResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
    }))
}

pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .lifecycle
        .complete_task(&query.id, state.today()?)
        .await?;
    Ok(Json(json!({})))
}
