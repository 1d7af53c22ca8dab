//! Runtime quality registry
//!
//! The registry is the long-lived lookup service handlers share. Reads
//! clone an `Arc` snapshot of the mapping and never block behind a reload;
//! `reload` parses and validates the fresh file fully before swapping it
//! in, so a broken edit can never evict a working mapping.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundle::{validate_bundle, validate_mapping, ValidationReport};
use crate::loader::load_mapping;
use crate::mapping::QualityMapping;
use crate::resolve::{resolve_parameters, Selection, SelectionRequest};
use crate::task::{QualityTier, TaskType};
use crate::{QualityError, Result};

/// One tier row as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierDescriptor {
    pub quality_tier: QualityTier,
    pub description: String,
    pub workflow_path: String,
    /// Tier defaults, before any caller overrides
    pub parameters: Map<String, Value>,
}

/// Summary returned by a successful reload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadSummary {
    pub version: u32,
    pub tasks: usize,
    pub bundles_ok: usize,
}

/// Shared lookup service over the loaded quality mapping
pub struct QualityRegistry {
    mapping_path: PathBuf,
    workflows_root: PathBuf,
    inner: RwLock<Arc<QualityMapping>>,
}

impl QualityRegistry {
    /// Load the mapping file and build a registry around it
    pub fn load(
        mapping_path: impl Into<PathBuf>,
        workflows_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mapping_path = mapping_path.into();
        let workflows_root = workflows_root.into();
        let mapping = load_mapping(&mapping_path)?;

        tracing::info!(
            "Loaded quality mapping from {} ({} task(s))",
            mapping_path.display(),
            mapping.tasks.len()
        );

        Ok(Self {
            mapping_path,
            workflows_root,
            inner: RwLock::new(Arc::new(mapping)),
        })
    }

    /// Build a registry from an already-parsed mapping
    pub fn from_mapping(mapping: QualityMapping, workflows_root: impl Into<PathBuf>) -> Self {
        Self {
            mapping_path: PathBuf::new(),
            workflows_root: workflows_root.into(),
            inner: RwLock::new(Arc::new(mapping)),
        }
    }

    /// Current mapping snapshot
    pub fn snapshot(&self) -> Arc<QualityMapping> {
        self.inner.read().clone()
    }

    /// Mapping file this registry reads
    pub fn mapping_path(&self) -> &Path {
        &self.mapping_path
    }

    /// Root directory workflow bundles resolve under
    pub fn workflows_root(&self) -> &Path {
        &self.workflows_root
    }

    /// Configured task types in catalogue order
    pub fn task_types(&self) -> Vec<TaskType> {
        self.snapshot().task_types()
    }

    /// Tier rows for one task type, low to high
    pub fn tiers_for(&self, task: TaskType) -> Result<Vec<TierDescriptor>> {
        let mapping = self.snapshot();
        let tiers = mapping.task(task)?;

        Ok(tiers
            .iter()
            .map(|(tier, target)| TierDescriptor {
                quality_tier: tier,
                description: target.description.clone(),
                workflow_path: target.workflow_path.clone(),
                parameters: target.parameters.clone(),
            })
            .collect())
    }

    /// Resolve a selection against the current snapshot
    ///
    /// Disk state can drift after load, so the bundle is re-checked here
    /// rather than trusted from the last validation run.
    pub fn resolve(&self, request: &SelectionRequest) -> Result<Selection> {
        let mapping = self.snapshot();
        let tiers = mapping.task(request.task_type)?;
        let target = tiers.tier(request.quality_tier);

        validate_bundle(&self.workflows_root, &target.workflow_path).map_err(|issue| {
            QualityError::Bundle {
                workflow_path: target.workflow_path.clone(),
                reason: issue.to_string(),
            }
        })?;

        let (parameters, adjustments) =
            resolve_parameters(target, &request.parameters, &mapping.constraints.floors)?;

        if !adjustments.is_empty() {
            for adj in &adjustments {
                tracing::debug!(
                    "Raised {} from {} to floor {} for {}/{}",
                    adj.parameter,
                    adj.requested,
                    adj.minimum,
                    request.task_type,
                    request.quality_tier
                );
            }
        }

        Ok(Selection {
            task_type: request.task_type,
            quality_tier: request.quality_tier,
            workflow_path: self.workflows_root.join(&target.workflow_path),
            description: target.description.clone(),
            parameters,
            adjustments,
        })
    }

    /// Validate every row of the current snapshot against the workflows root
    pub fn validate(&self) -> ValidationReport {
        validate_mapping(&self.snapshot(), &self.workflows_root)
    }

    /// Re-read the mapping file and swap it in if fully valid
    ///
    /// Validation covers both the document and every referenced bundle; on
    /// any failure the previous mapping stays active.
    pub fn reload(&self) -> Result<ReloadSummary> {
        let mapping = load_mapping(&self.mapping_path)?;
        let report = validate_mapping(&mapping, &self.workflows_root);

        if !report.is_ok() {
            let first = &report.issues[0];
            return Err(QualityError::InvalidMapping(format!(
                "{} bundle issue(s); first: {}/{} at {} ({})",
                report.issues.len(),
                first.task_type,
                first.quality_tier,
                first.workflow_path,
                first.issue
            )));
        }

        let summary = ReloadSummary {
            version: mapping.version,
            tasks: mapping.tasks.len(),
            bundles_ok: report.bundles_ok,
        };

        *self.inner.write() = Arc::new(mapping);
        tracing::info!(
            "Reloaded quality mapping ({} task(s), {} bundle(s) ok)",
            summary.tasks,
            summary.bundles_ok
        );
        Ok(summary)
    }
}
