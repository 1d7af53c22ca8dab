//! API data transfer objects and response models
//!
//! Request bodies keep task type and tier as plain strings so the handlers
//! control the status code of a failed parse; the closed enums from the
//! quality crate would otherwise surface as generic deserialization errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ws::progress::TaskStatus;
use quality::{TaskType, TierDescriptor};

/// System health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Quality mapping status
    pub mapping: String,
    /// API version
    pub version: String,
    /// Configured task count, detailed check only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<usize>,
    /// Seconds since startup, detailed check only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    /// Current timestamp
    pub timestamp: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn new(status: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            mapping: mapping.into(),
            version: crate::VERSION.to_string(),
            tasks: None,
            uptime_seconds: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attach the detailed-check fields
    pub fn with_details(mut self, tasks: usize, uptime_seconds: u64) -> Self {
        self.tasks = Some(tasks);
        self.uptime_seconds = Some(uptime_seconds);
        self
    }
}

/// System info response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfoResponse {
    /// Configured server name
    pub name: String,
    /// Application version
    pub version: String,
    /// Task types with configured tiers
    pub tasks: Vec<TaskType>,
    /// Quality mapping file in use
    pub mapping_path: String,
    /// Workflow bundles root in use
    pub workflows_root: String,
    /// Currently connected WebSocket clients
    pub ws_clients: usize,
}

/// One row of the task catalogue listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTypeSummary {
    /// Task type wire name
    pub task_type: TaskType,
    /// Whether the mapping configures tiers for it
    pub configured: bool,
}

/// Tier listing for one task type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiersResponse {
    pub task_type: TaskType,
    /// Tier rows, low to high
    pub tiers: Vec<TierDescriptor>,
}

/// Request body for POST /api/v1/quality/select
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectQualityRequest {
    /// Task type wire name
    pub task_type: String,
    /// Tier wire name; omitted means standard
    #[serde(default)]
    pub quality_tier: Option<String>,
    /// Caller parameters merged over the tier defaults
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Request body for POST /api/v1/progress/report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProgressRequest {
    /// Task the update belongs to
    pub task_id: String,
    /// Progress percentage (0-100)
    pub progress: u32,
    /// Free-form progress message
    #[serde(default)]
    pub message: String,
    /// Reported task state; omitted means still running
    #[serde(default)]
    pub status: TaskStatus,
    /// Failure cause, required when the status is failed
    #[serde(default)]
    pub error: Option<String>,
}
