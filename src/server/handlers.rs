use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::core::task::{NewTask, Task, TaskPatch};

/// Body of a delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

/// `GET /api/tasks`
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.store.list().await)
}

/// `POST /api/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    Json(fields): Json<NewTask>,
) -> Result<Json<Task>, ApiError> {
    let task = state.store.create(fields).await?;
    Ok(Json(task))
}

/// `PUT /api/tasks/{id}`
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    match state.store.update(&id, patch).await {
        Ok(task) => Ok(Json(task)),
        Err(e) => {
            log::warn!("Update of task {} rejected: {}", id, e);
            Err(e.into())
        }
    }
}

/// `DELETE /api/tasks/{id}`; succeeds whether or not the task existed.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Confirmation> {
    state.store.delete(&id).await;
    Json(Confirmation {
        message: "Deleted".to_string(),
    })
}

/// CORS preflight.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
