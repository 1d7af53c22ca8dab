//! Workflow bundle checks
//!
//! A workflow bundle is a directory under the workflows root holding the
//! ComfyUI graph export (`workflow.json`) and a small `manifest.yaml` with
//! human-facing metadata. The graph file is treated as opaque: presence is
//! checked, contents are never parsed here. The manifest is parsed and must
//! at least carry a name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::mapping::QualityMapping;
use crate::task::{QualityTier, TaskType};

/// Graph file expected inside every bundle
pub const WORKFLOW_FILE: &str = "workflow.json";
/// Manifest file expected inside every bundle
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Bundle metadata parsed from `manifest.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Bundle display name
    pub name: String,
    /// Bundle revision, advisory
    #[serde(default = "default_manifest_version")]
    pub version: String,
    /// Longer description for catalogue listings
    #[serde(default)]
    pub description: Option<String>,
    /// Placeholder keys the graph expects to be filled, advisory
    #[serde(default)]
    pub inputs: Vec<String>,
}

fn default_manifest_version() -> String {
    "1".to_string()
}

/// Why a bundle failed its on-disk check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleIssue {
    /// The bundle directory itself does not exist
    DirectoryMissing,
    /// `workflow.json` is absent
    WorkflowMissing,
    /// `manifest.yaml` is absent
    ManifestMissing,
    /// `manifest.yaml` exists but could not be read or parsed
    ManifestInvalid(String),
}

impl fmt::Display for BundleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleIssue::DirectoryMissing => write!(f, "bundle directory missing"),
            BundleIssue::WorkflowMissing => write!(f, "{WORKFLOW_FILE} missing"),
            BundleIssue::ManifestMissing => write!(f, "{MANIFEST_FILE} missing"),
            BundleIssue::ManifestInvalid(reason) => write!(f, "invalid {MANIFEST_FILE}: {reason}"),
        }
    }
}

/// Check one bundle directory and parse its manifest
pub fn validate_bundle(
    workflows_root: &Path,
    workflow_path: &str,
) -> std::result::Result<BundleManifest, BundleIssue> {
    let dir = workflows_root.join(workflow_path);
    if !dir.is_dir() {
        return Err(BundleIssue::DirectoryMissing);
    }
    if !dir.join(WORKFLOW_FILE).is_file() {
        return Err(BundleIssue::WorkflowMissing);
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(BundleIssue::ManifestMissing);
    }

    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|e| BundleIssue::ManifestInvalid(e.to_string()))?;
    let manifest: BundleManifest =
        serde_yaml::from_str(&content).map_err(|e| BundleIssue::ManifestInvalid(e.to_string()))?;

    if manifest.name.trim().is_empty() {
        return Err(BundleIssue::ManifestInvalid("name is empty".to_string()));
    }

    Ok(manifest)
}

/// One failed row from a full mapping validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub task_type: TaskType,
    pub quality_tier: QualityTier,
    pub workflow_path: String,
    /// Human-readable cause
    pub issue: String,
}

/// Outcome of validating every row of a mapping against the workflows root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Configured task count
    pub tasks: usize,
    /// Rows whose bundle checks passed
    pub bundles_ok: usize,
    /// Rows that failed, with causes
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when every configured row points at a deployable bundle
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate every (task, tier) row of a mapping against the workflows root
pub fn validate_mapping(mapping: &QualityMapping, workflows_root: &Path) -> ValidationReport {
    let mut bundles_ok = 0;
    let mut issues = Vec::new();

    for (task, tiers) in &mapping.tasks {
        for (tier, target) in tiers.iter() {
            match validate_bundle(workflows_root, &target.workflow_path) {
                Ok(_) => bundles_ok += 1,
                Err(issue) => {
                    tracing::warn!(
                        "Bundle check failed for {}/{} at {}: {}",
                        task,
                        tier,
                        target.workflow_path,
                        issue
                    );
                    issues.push(ValidationIssue {
                        task_type: *task,
                        quality_tier: tier,
                        workflow_path: target.workflow_path.clone(),
                        issue: issue.to_string(),
                    });
                }
            }
        }
    }

    ValidationReport {
        tasks: mapping.tasks.len(),
        bundles_ok,
        issues,
    }
}
