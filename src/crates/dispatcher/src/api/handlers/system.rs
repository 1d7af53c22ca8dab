//! System information endpoint handler

use axum::extract::State;

use crate::api::{error::ApiResult, models::SystemInfoResponse, response, routes::AppState};

/// Handler for GET /api/v1/system/info
///
/// Returns server identity plus the mapping and workflows root in use.
pub async fn system_info(
    State(app_state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let info = SystemInfoResponse {
        name: app_state.server_name.clone(),
        version: crate::VERSION.to_string(),
        tasks: app_state.registry.task_types(),
        mapping_path: app_state.registry.mapping_path().display().to_string(),
        workflows_root: app_state.registry.workflows_root().display().to_string(),
        ws_clients: app_state.events.client_count(),
    };

    Ok(response::ok(info))
}
