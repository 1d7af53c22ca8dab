//! Task progress board
//!
//! Latest-state progress tracking per task. Workflow runners report through
//! the REST API; the board keeps the most recent snapshot so late-joining
//! UIs can render current state without replaying the event stream.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reported task state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is still producing output
    #[default]
    Running,
    /// Task finished successfully
    Completed,
    /// Task gave up
    Failed,
}

/// Progress snapshot for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Task ID
    pub task_id: String,
    /// Progress percentage (0-100)
    pub progress: u32,
    /// Progress message
    pub message: String,
    /// Reported state
    pub status: TaskStatus,
    /// Failure cause, present when the status is failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
}

impl TaskProgress {
    /// Create new task progress, clamping the percentage
    pub fn new(task_id: String, progress: u32, message: String) -> Self {
        Self {
            task_id,
            progress: std::cmp::min(progress, 100),
            message,
            status: TaskStatus::Running,
            error: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Same snapshot with a different reported state
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Same snapshot with a failure cause attached
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

/// Latest-state progress store shared across handlers
pub struct ProgressBoard {
    entries: Arc<DashMap<String, TaskProgress>>,
}

impl ProgressBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Record a progress update, returning the stored snapshot
    pub fn update(
        &self,
        task_id: &str,
        progress: u32,
        message: String,
        status: TaskStatus,
        error: Option<String>,
    ) -> TaskProgress {
        let snapshot = TaskProgress::new(task_id.to_string(), progress, message)
            .with_status(status)
            .with_error(error);
        self.entries.insert(task_id.to_string(), snapshot.clone());
        snapshot
    }

    /// Latest snapshot for one task
    pub fn get(&self, task_id: &str) -> Option<TaskProgress> {
        self.entries.get(task_id).map(|entry| entry.value().clone())
    }

    /// All snapshots, ordered by task ID
    pub fn all(&self) -> Vec<TaskProgress> {
        let mut snapshots: Vec<TaskProgress> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        snapshots.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        snapshots
    }

    /// Tasks still reported as running
    pub fn active(&self) -> Vec<TaskProgress> {
        self.all()
            .into_iter()
            .filter(|snapshot| snapshot.status == TaskStatus::Running)
            .collect()
    }

    /// Drop a task's record, returning whether it existed
    pub fn remove(&self, task_id: &str) -> bool {
        self.entries.remove(task_id).is_some()
    }

    /// Number of tracked tasks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProgressBoard {
    fn default() -> Self {
        Self::new()
    }
}
