//! Quality dispatch endpoint handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{
    error::ApiResult,
    models::{SelectQualityRequest, TaskTypeSummary, TiersResponse},
    response,
    routes::AppState,
    ws::UiEvent,
};
use quality::{QualityTier, SelectionRequest, TaskType};

/// List the task catalogue with configuration state
///
/// GET /api/v1/quality/tasks
pub async fn list_tasks(
    State(app_state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let configured = app_state.registry.task_types();

    let tasks: Vec<TaskTypeSummary> = TaskType::ALL
        .iter()
        .map(|task| TaskTypeSummary {
            task_type: *task,
            configured: configured.contains(task),
        })
        .collect();

    Ok(response::ok(tasks))
}

/// List the three tier rows for a task type
///
/// GET /api/v1/quality/tiers/:task_type
pub async fn get_tiers(
    State(app_state): State<AppState>,
    Path(task_type): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let task: TaskType = task_type.parse()?;
    let tiers = app_state.registry.tiers_for(task)?;

    Ok(response::ok(TiersResponse {
        task_type: task,
        tiers,
    }))
}

/// Resolve a selection to a concrete workflow invocation
///
/// POST /api/v1/quality/select
pub async fn select_quality(
    State(app_state): State<AppState>,
    Json(req): Json<SelectQualityRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let task: TaskType = req.task_type.parse()?;
    let tier = match req.quality_tier.as_deref() {
        Some(raw) => raw.parse::<QualityTier>()?,
        None => QualityTier::default(),
    };

    let request = SelectionRequest {
        task_type: task,
        quality_tier: tier,
        parameters: req.parameters,
    };
    let selection = app_state.registry.resolve(&request)?;

    app_state
        .events
        .broadcast_lossy(UiEvent::selection_resolved(&selection));

    tracing::info!(
        "Resolved {}/{} to {}",
        task,
        tier,
        selection.workflow_path.display()
    );
    Ok(response::ok(selection))
}

/// Validate every configured row against the workflows root
///
/// POST /api/v1/quality/validate
pub async fn validate_mapping(
    State(app_state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let report = app_state.registry.validate();
    Ok(response::ok(report))
}

/// Reload the mapping file, swapping it in only when fully valid
///
/// POST /api/v1/quality/reload
pub async fn reload_mapping(
    State(app_state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let summary = app_state.registry.reload()?;

    app_state
        .events
        .broadcast_lossy(UiEvent::config_reloaded(&summary));

    tracing::info!("Mapping reloaded: {} task(s)", summary.tasks);
    Ok(response::ok(summary))
}
