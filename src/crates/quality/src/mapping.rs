//! Quality mapping document model
//!
//! The mapping file is the single source of truth for what each quality
//! tier means per task type. Deserialization enforces the structural rules
//! (every configured task carries all three tiers, unknown task keys are
//! rejected by the closed [`TaskType`] enum) and `validate` covers the
//! rules serde cannot express.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::task::{QualityTier, TaskType};
use crate::{QualityError, Result};

/// One configured (task, tier) row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierTarget {
    /// Bundle directory, relative to the workflows root
    pub workflow_path: String,
    /// One line shown in tier pickers
    pub description: String,
    /// Tier default parameters, merged under caller parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// The three tier rows of one task type
///
/// All three fields are required. A task configured with a missing tier is
/// a mapping error, not a runtime fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTiers {
    pub low: TierTarget,
    pub standard: TierTarget,
    pub high: TierTarget,
}

impl TaskTiers {
    /// Row for one tier
    pub fn tier(&self, tier: QualityTier) -> &TierTarget {
        match tier {
            QualityTier::Low => &self.low,
            QualityTier::Standard => &self.standard,
            QualityTier::High => &self.high,
        }
    }

    /// (tier, row) pairs in ascending tier order
    pub fn iter(&self) -> impl Iterator<Item = (QualityTier, &TierTarget)> {
        QualityTier::ALL.iter().map(move |tier| (*tier, self.tier(*tier)))
    }
}

/// Parameter floor constraints
///
/// Floors clamp merged parameters from below: a caller may lower quality
/// settings, but never past the minimum the pipeline can render with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Minimum values keyed by top-level parameter name
    #[serde(default)]
    pub floors: BTreeMap<String, f64>,
}

impl Constraints {
    /// Floors that ship enabled whether or not the file mentions them
    ///
    /// Sampling below 10 steps produces unusable output on every backend
    /// the catalogue targets.
    pub fn builtin_floors() -> BTreeMap<String, f64> {
        BTreeMap::from([("steps".to_string(), 10.0)])
    }

    /// Fill in built-in floors the file leaves unstated
    ///
    /// An explicit entry in the file wins over the built-in value.
    pub fn apply_builtin(&mut self) {
        for (name, minimum) in Self::builtin_floors() {
            self.floors.entry(name).or_insert(minimum);
        }
    }
}

/// Complete quality mapping document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMapping {
    /// Document schema version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Floor constraints applied after merging
    #[serde(default)]
    pub constraints: Constraints,
    /// Configured tasks, possibly a subset of the known catalogue
    #[serde(default)]
    pub tasks: BTreeMap<TaskType, TaskTiers>,
}

fn default_version() -> u32 {
    1
}

impl QualityMapping {
    /// Tier rows for a task type
    pub fn task(&self, task: TaskType) -> Result<&TaskTiers> {
        self.tasks
            .get(&task)
            .ok_or(QualityError::TaskNotConfigured(task))
    }

    /// Configured task types in catalogue order
    pub fn task_types(&self) -> Vec<TaskType> {
        self.tasks.keys().copied().collect()
    }

    /// Rules serde cannot check: path shape and floor sanity
    pub fn validate(&self) -> Result<()> {
        for (task, tiers) in &self.tasks {
            for (tier, target) in tiers.iter() {
                validate_workflow_path(&target.workflow_path)
                    .map_err(|reason| QualityError::InvalidMapping(format!("{task}/{tier}: {reason}")))?;
            }
        }

        for (name, minimum) in &self.constraints.floors {
            if !minimum.is_finite() || *minimum < 0.0 {
                return Err(QualityError::InvalidMapping(format!(
                    "floor {name} must be a finite non-negative number, got {minimum}"
                )));
            }
        }

        Ok(())
    }
}

/// Reject empty, absolute and parent-escaping bundle paths
fn validate_workflow_path(path: &str) -> std::result::Result<(), String> {
    if path.trim().is_empty() {
        return Err("workflow_path is empty".to_string());
    }

    let parsed = Path::new(path);
    if parsed.is_absolute() {
        return Err(format!("workflow_path {path:?} must be relative to the workflows root"));
    }
    if parsed.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(format!("workflow_path {path:?} must not contain '..'"));
    }

    Ok(())
}
