//! Event definitions and serialization for real-time streaming
//!
//! Every event serializes as `{"type": "...", "data": {...}}` with dotted
//! type names, the shape UI clients switch on.

use serde::{Deserialize, Serialize};

use crate::api::ws::progress::TaskProgress;
use quality::{FloorAdjustment, QualityTier, ReloadSummary, Selection, TaskType};

/// Real-time event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiEvent {
    /// Connection established
    #[serde(rename = "connection.established")]
    ConnectionEstablished { client_id: String, timestamp: String },

    /// Quality mapping reloaded
    #[serde(rename = "config.reloaded")]
    ConfigReloaded {
        version: u32,
        tasks: usize,
        timestamp: String,
    },

    /// A selection was resolved to a workflow
    #[serde(rename = "selection.resolved")]
    SelectionResolved {
        selection_id: String,
        task_type: TaskType,
        quality_tier: QualityTier,
        workflow_path: String,
        adjustments: Vec<FloorAdjustment>,
        timestamp: String,
    },

    /// Task progress update
    #[serde(rename = "task.progress")]
    TaskProgress {
        task_id: String,
        progress: u32,
        message: String,
        timestamp: String,
    },

    /// Task completed
    #[serde(rename = "task.completed")]
    TaskCompleted {
        task_id: String,
        message: String,
        timestamp: String,
    },

    /// Task failed
    #[serde(rename = "task.failed")]
    TaskFailed {
        task_id: String,
        error: String,
        timestamp: String,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        code: Option<String>,
    },
}

impl UiEvent {
    /// Connection greeting for a new client
    pub fn connection_established(client_id: impl Into<String>) -> Self {
        UiEvent::ConnectionEstablished {
            client_id: client_id.into(),
            timestamp: now(),
        }
    }

    /// Reload notification from a reload summary
    pub fn config_reloaded(summary: &ReloadSummary) -> Self {
        UiEvent::ConfigReloaded {
            version: summary.version,
            tasks: summary.tasks,
            timestamp: now(),
        }
    }

    /// Resolution notification from a resolved selection
    pub fn selection_resolved(selection: &Selection) -> Self {
        UiEvent::SelectionResolved {
            selection_id: uuid::Uuid::new_v4().to_string(),
            task_type: selection.task_type,
            quality_tier: selection.quality_tier,
            workflow_path: selection.workflow_path.display().to_string(),
            adjustments: selection.adjustments.clone(),
            timestamp: now(),
        }
    }

    /// Progress update from a board snapshot
    pub fn task_progress(snapshot: &TaskProgress) -> Self {
        UiEvent::TaskProgress {
            task_id: snapshot.task_id.clone(),
            progress: snapshot.progress,
            message: snapshot.message.clone(),
            timestamp: snapshot.updated_at.clone(),
        }
    }

    /// Completion notification
    pub fn task_completed(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        UiEvent::TaskCompleted {
            task_id: task_id.into(),
            message: message.into(),
            timestamp: now(),
        }
    }

    /// Failure notification
    pub fn task_failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        UiEvent::TaskFailed {
            task_id: task_id.into(),
            error: error.into(),
            timestamp: now(),
        }
    }

    /// Get event type as string
    pub fn event_type(&self) -> &str {
        match self {
            UiEvent::ConnectionEstablished { .. } => "connection.established",
            UiEvent::ConfigReloaded { .. } => "config.reloaded",
            UiEvent::SelectionResolved { .. } => "selection.resolved",
            UiEvent::TaskProgress { .. } => "task.progress",
            UiEvent::TaskCompleted { .. } => "task.completed",
            UiEvent::TaskFailed { .. } => "task.failed",
            UiEvent::Error { .. } => "error",
        }
    }

    /// Extract task ID if present
    pub fn task_id(&self) -> Option<&str> {
        match self {
            UiEvent::TaskProgress { task_id, .. }
            | UiEvent::TaskCompleted { task_id, .. }
            | UiEvent::TaskFailed { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    /// Convert to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
