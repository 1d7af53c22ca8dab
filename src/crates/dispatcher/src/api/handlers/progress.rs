//! Progress reporting and query handlers
//!
//! Workflow runners push updates here; the dispatcher fans them out to
//! WebSocket clients and keeps the latest snapshot per task for late
//! joiners. No execution happens in this service.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{
    error::{ApiError, ApiResult},
    middleware::validation::{validate_not_empty, validate_progress},
    models::ReportProgressRequest,
    response,
    routes::AppState,
    ws::{TaskStatus, UiEvent},
};

/// List the latest snapshot of every tracked task
///
/// GET /api/v1/progress
pub async fn list_progress(
    State(app_state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    Ok(response::ok(app_state.progress.all()))
}

/// Latest snapshot for one task
///
/// GET /api/v1/progress/:task_id
pub async fn get_progress(
    State(app_state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let snapshot = app_state
        .progress
        .get(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("No progress recorded for task: {task_id}")))?;

    Ok(response::ok(snapshot))
}

/// Drop a task's progress record
///
/// DELETE /api/v1/progress/:task_id
pub async fn clear_progress(
    State(app_state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    if !app_state.progress.remove(&task_id) {
        return Err(ApiError::NotFound(format!(
            "No progress recorded for task: {task_id}"
        )));
    }

    Ok(response::no_content())
}

/// Accept a progress report and broadcast it
///
/// POST /api/v1/progress/report
pub async fn report_progress(
    State(app_state): State<AppState>,
    Json(req): Json<ReportProgressRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    validate_not_empty(&req.task_id, "task_id")?;
    validate_progress(req.progress)?;
    if req.status == TaskStatus::Failed && req.error.is_none() {
        return Err(ApiError::ValidationError(
            "error is required when status is failed".to_string(),
        ));
    }

    let snapshot = app_state.progress.update(
        &req.task_id,
        req.progress,
        req.message.clone(),
        req.status,
        req.error.clone(),
    );

    let event = match req.status {
        TaskStatus::Completed => UiEvent::task_completed(&req.task_id, &req.message),
        TaskStatus::Failed => {
            let cause = req.error.as_deref().unwrap_or_default();
            UiEvent::task_failed(&req.task_id, cause)
        }
        TaskStatus::Running => UiEvent::task_progress(&snapshot),
    };
    app_state.events.broadcast_lossy(event);

    tracing::debug!(
        "Progress for {}: {}% ({:?})",
        req.task_id,
        req.progress,
        req.status
    );
    Ok(response::accepted(snapshot))
}
