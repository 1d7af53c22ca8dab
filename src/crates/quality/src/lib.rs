//! Quality-tier mapping core for Callsheet
//!
//! Production quality in Callsheet is a single administrator-maintained
//! table: for each generation task type, the three tiers `low`, `standard`
//! and `high` each name a ComfyUI workflow bundle and the default parameters
//! it runs with. This crate owns that table end to end:
//!
//! - [`mapping`]: the document model and its structural rules
//! - [`loader`]: YAML loading with environment variable expansion
//! - [`bundle`]: on-disk workflow bundle checks (graph file plus manifest)
//! - [`resolve`]: merging caller parameters over tier defaults and applying
//!   parameter floors
//! - [`registry`]: the shared runtime lookup service with atomic reload
//!
//! The HTTP and WebSocket surfaces live in the `dispatcher` crate; the
//! `callsheet` CLI drives validation and offline resolution from the same
//! primitives.

pub mod bundle;
pub mod loader;
pub mod mapping;
pub mod registry;
pub mod resolve;
pub mod task;

pub use bundle::{BundleIssue, BundleManifest, ValidationIssue, ValidationReport};
pub use mapping::{Constraints, QualityMapping, TaskTiers, TierTarget};
pub use registry::{QualityRegistry, ReloadSummary, TierDescriptor};
pub use resolve::{FloorAdjustment, Selection, SelectionRequest};
pub use task::{QualityTier, TaskType};

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, validating or resolving quality mappings
#[derive(Debug, Error)]
pub enum QualityError {
    /// Task type string outside the known catalogue
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    /// Known task type with no rows in the loaded mapping
    #[error("Task type not configured: {0}")]
    TaskNotConfigured(TaskType),

    /// Tier string outside low, standard and high
    #[error("Unknown quality tier: {0} (expected low, standard or high)")]
    UnknownTier(String),

    /// A floor applies to this parameter but the supplied value is not numeric
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A workflow bundle referenced by the mapping failed its on-disk check
    #[error("Workflow bundle {workflow_path}: {reason}")]
    Bundle { workflow_path: String, reason: String },

    /// Mapping document failed schema or post-parse validation
    #[error("Invalid quality mapping: {0}")]
    InvalidMapping(String),

    /// File read failure
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax failure
    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, QualityError>;
