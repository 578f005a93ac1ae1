//! Handlers for optimization submission and task queries.
//!
//! Submission returns as soon as the task is admitted; callers poll
//! `GET /api/v1/tasks/{id}` for the outcome.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::optimization::SubmitOptimization;
use folio_core::task::TaskStatus;
use folio_core::types::TaskId;
use folio_worker::engine::TaskView;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmittedTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/optimizations
///
/// Admit a new optimization. Returns 202 with the task id, 400 when a
/// field is missing or invalid, 429 while another optimization runs.
pub async fn submit_optimization(
    State(state): State<AppState>,
    body: Result<Json<SubmitOptimization>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let task_id = state.jobs.submit(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmittedTask {
                task_id,
                status: TaskStatus::Running,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// GET /api/v1/tasks/{id}
///
/// Current state of a task. Ids that do not parse as UUIDs cannot name a
/// task and are reported as not found.
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<TaskView>>> {
    let task_id: TaskId = id.parse().map_err(|_| CoreError::NotFound {
        entity: "Task",
        id: id.clone(),
    })?;

    let view = state.jobs.query(task_id).await?;
    Ok(Json(DataResponse { data: view }))
}
