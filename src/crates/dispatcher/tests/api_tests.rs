//! Integration tests for dispatcher API endpoints
//!
//! Each test builds a real mapping file and bundle tree on disk, loads a
//! registry over them and drives the router with oneshot requests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use dispatcher::api::routes::{create_router, AppState};
use dispatcher::api::ws::EventBus;
use quality::bundle::{MANIFEST_FILE, WORKFLOW_FILE};
use quality::QualityRegistry;

const MAPPING: &str = r#"
version: 1
tasks:
  text_to_image:
    low:
      workflow_path: image/draft
      description: Draft stills
      parameters: {steps: 12, width: 768}
    standard:
      workflow_path: image/standard
      description: Production stills
      parameters: {steps: 25, width: 1280}
    high:
      workflow_path: image/final
      description: Final renders
      parameters: {steps: 40, width: 1920}
"#;

fn make_bundle(root: &Path, rel: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(WORKFLOW_FILE), "{}").unwrap();
    fs::write(dir.join(MANIFEST_FILE), format!("name: {rel}\n")).unwrap();
}

/// Test helper: mapping plus bundles on disk, registry loaded over them
fn setup_state(dir: &TempDir) -> AppState {
    let workflows = dir.path().join("workflows");
    for rel in ["image/draft", "image/standard", "image/final"] {
        make_bundle(&workflows, rel);
    }
    let mapping_path = dir.path().join("quality.yaml");
    fs::write(&mapping_path, MAPPING).unwrap();

    let registry = Arc::new(QualityRegistry::load(&mapping_path, &workflows).unwrap());
    AppState::new(registry, EventBus::new(16), "test-dispatcher")
}

fn setup_app(dir: &TempDir) -> axum::Router {
    create_router(setup_state(dir))
}

/// Test helper: create request without a body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: create request with a JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_detailed_health_reports_bundles() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/system/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["mapping"], "3 bundle(s) ok");
    assert_eq!(body["tasks"], json!(1));
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_detailed_health_degrades_on_broken_bundle() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);
    fs::remove_dir_all(dir.path().join("workflows/image/final")).unwrap();

    let response = app
        .oneshot(test_request("GET", "/api/v1/system/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_system_info() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/system/info"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["name"], "test-dispatcher");
    assert_eq!(body["data"]["tasks"], json!(["text_to_image"]));
    assert_eq!(body["data"]["ws_clients"], json!(0));
    assert!(body["data"]["workflows_root"].as_str().unwrap().ends_with("workflows"));
}

#[tokio::test]
async fn test_task_catalogue_flags_configured_tasks() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/quality/tasks"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 5);

    let image = tasks
        .iter()
        .find(|t| t["task_type"] == "text_to_image")
        .unwrap();
    assert_eq!(image["configured"], json!(true));

    let voice = tasks
        .iter()
        .find(|t| t["task_type"] == "voice_conversion")
        .unwrap();
    assert_eq!(voice["configured"], json!(false));
}

#[tokio::test]
async fn test_tier_listing() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/quality/tiers/text_to_image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let tiers = body["data"]["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 3);
    assert_eq!(tiers[0]["quality_tier"], "low");
    assert_eq!(tiers[1]["workflow_path"], "image/standard");
    assert_eq!(tiers[2]["parameters"]["steps"], json!(40));
}

#[tokio::test]
async fn test_tier_listing_unknown_task_is_404() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/quality/tiers/text_to_hologram"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("text_to_hologram"));
}

#[tokio::test]
async fn test_tier_listing_unconfigured_task_is_404() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/api/v1/quality/tiers/lipsync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("not configured"));
}

#[tokio::test]
async fn test_select_defaults_to_standard_tier() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_image"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["quality_tier"], "standard");
    assert_eq!(body["data"]["parameters"]["steps"], json!(25));
    assert!(body["data"]["workflow_path"]
        .as_str()
        .unwrap()
        .ends_with("image/standard"));
}

#[tokio::test]
async fn test_select_merges_overrides_and_applies_floor() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({
                "task_type": "text_to_image",
                "quality_tier": "low",
                "parameters": {"steps": 3, "seed": 99}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let data = &body["data"];
    assert_eq!(data["parameters"]["steps"], json!(10));
    assert_eq!(data["parameters"]["seed"], json!(99));
    assert_eq!(data["parameters"]["width"], json!(768));

    let adjustments = data["adjustments"].as_array().unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0]["parameter"], "steps");
    assert_eq!(adjustments[0]["requested"], json!(3.0));
    assert_eq!(adjustments[0]["minimum"], json!(10.0));
}

#[tokio::test]
async fn test_select_unknown_task_is_404() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_hologram"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_select_invalid_tier_is_400() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_image", "quality_tier": "ultra"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("ultra"));
}

#[tokio::test]
async fn test_select_non_numeric_floored_parameter_is_422() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({
                "task_type": "text_to_image",
                "quality_tier": "low",
                "parameters": {"steps": "many"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_select_missing_bundle_is_500() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);
    fs::remove_dir_all(dir.path().join("workflows/image/final")).unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_image", "quality_tier": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(body["message"].as_str().unwrap().contains("image/final"));
}

#[tokio::test]
async fn test_select_broadcasts_resolution_event() {
    let dir = TempDir::new().unwrap();
    let state = setup_state(&dir);
    let mut rx = state.events.subscribe();
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_image", "quality_tier": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type(), "selection.resolved");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/quality/select")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_endpoint_reports_broken_rows() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);
    fs::remove_file(dir.path().join("workflows/image/draft").join(WORKFLOW_FILE)).unwrap();

    let response = app
        .oneshot(test_request("POST", "/api/v1/quality/validate"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let report = &body["data"];
    assert_eq!(report["tasks"], json!(1));
    assert_eq!(report["bundles_ok"], json!(2));

    let issues = report["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["quality_tier"], "low");
    assert_eq!(issues[0]["workflow_path"], "image/draft");
}

#[tokio::test]
async fn test_reload_swaps_in_new_mapping() {
    let dir = TempDir::new().unwrap();
    let state = setup_state(&dir);
    let mut rx = state.events.subscribe();
    let app = create_router(state);

    for rel in ["lipsync/draft", "lipsync/standard", "lipsync/final"] {
        make_bundle(&dir.path().join("workflows"), rel);
    }
    let extended = format!(
        "{MAPPING}  lipsync:
    low: {{workflow_path: lipsync/draft, description: Draft}}
    standard: {{workflow_path: lipsync/standard, description: Standard}}
    high: {{workflow_path: lipsync/final, description: Final}}
"
    );
    fs::write(dir.path().join("quality.yaml"), extended).unwrap();

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/v1/quality/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["tasks"], json!(2));
    assert_eq!(body["data"]["bundles_ok"], json!(6));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type(), "config.reloaded");

    // New task is immediately visible.
    let response = app
        .oneshot(test_request("GET", "/api/v1/quality/tiers/lipsync"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_reload_keeps_serving_old_mapping() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    fs::write(dir.path().join("quality.yaml"), "tasks: [broken").unwrap();

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/v1/quality/reload"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/quality/select",
            json!({"task_type": "text_to_image"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_progress_report_round_trip() {
    let dir = TempDir::new().unwrap();
    let state = setup_state(&dir);
    let mut rx = state.events.subscribe();
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({"task_id": "shot-42", "progress": 55, "message": "Sampling"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type(), "task.progress");
    assert_eq!(event.task_id(), Some("shot-42"));

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/v1/progress/shot-42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["progress"], json!(55));
    assert_eq!(body["data"]["status"], "running");

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/v1/progress"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/api/v1/progress/shot-42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(test_request("GET", "/api/v1/progress/shot-42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_completion_broadcasts_completed_event() {
    let dir = TempDir::new().unwrap();
    let state = setup_state(&dir);
    let mut rx = state.events.subscribe();
    let app = create_router(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({"task_id": "shot-7", "progress": 100, "message": "Rendered", "status": "completed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type(), "task.completed");
}

#[tokio::test]
async fn test_progress_failure_keeps_the_cause() {
    let dir = TempDir::new().unwrap();
    let state = setup_state(&dir);
    let mut rx = state.events.subscribe();
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({
                "task_id": "shot-9",
                "progress": 60,
                "status": "failed",
                "error": "CUDA out of memory"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type(), "task.failed");

    let response = app
        .oneshot(test_request("GET", "/api/v1/progress/shot-9"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["error"], "CUDA out of memory");
}

#[tokio::test]
async fn test_progress_report_validation() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({"task_id": "", "progress": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({"task_id": "shot-1", "progress": 150}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A failure report must name its cause.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/progress/report",
            json!({"task_id": "shot-1", "progress": 60, "status": "failed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
