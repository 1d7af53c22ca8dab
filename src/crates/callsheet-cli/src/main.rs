//! # callsheet-cli
//!
//! Command line companion for the Callsheet quality dispatcher. Inspects
//! and validates the quality mapping, resolves selections offline and
//! scaffolds a starter configuration.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use quality::bundle::{MANIFEST_FILE, WORKFLOW_FILE};
use quality::{QualityRegistry, QualityTier, SelectionRequest, TaskType};

#[derive(Parser)]
#[command(name = "callsheet")]
#[command(about = "Callsheet - map quality tiers to ComfyUI workflow bundles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the quality mapping against the workflow tree
    Validate {
        /// Path to the quality mapping file
        #[arg(long, env = "CALLSHEET_CONFIG", default_value = "config/quality.yaml")]
        config: PathBuf,

        /// Root directory of the workflow bundles
        #[arg(long, env = "CALLSHEET_WORKFLOWS", default_value = "workflows")]
        workflows_root: PathBuf,

        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List configured task types
    Tasks {
        /// Path to the quality mapping file
        #[arg(long, env = "CALLSHEET_CONFIG", default_value = "config/quality.yaml")]
        config: PathBuf,

        /// Root directory of the workflow bundles
        #[arg(long, env = "CALLSHEET_WORKFLOWS", default_value = "workflows")]
        workflows_root: PathBuf,
    },

    /// Show the quality tiers of a task type
    Tiers {
        /// Task type (e.g. text_to_image)
        task_type: String,

        /// Path to the quality mapping file
        #[arg(long, env = "CALLSHEET_CONFIG", default_value = "config/quality.yaml")]
        config: PathBuf,

        /// Root directory of the workflow bundles
        #[arg(long, env = "CALLSHEET_WORKFLOWS", default_value = "workflows")]
        workflows_root: PathBuf,
    },

    /// Resolve a selection to its workflow and parameter set (dry run)
    Resolve {
        /// Task type (e.g. text_to_image)
        task_type: String,

        /// Quality tier
        #[arg(default_value = "standard")]
        tier: String,

        /// Parameter overrides as a JSON object
        #[arg(short, long)]
        params: Option<String>,

        /// Output format: json (default), text
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Path to the quality mapping file
        #[arg(long, env = "CALLSHEET_CONFIG", default_value = "config/quality.yaml")]
        config: PathBuf,

        /// Root directory of the workflow bundles
        #[arg(long, env = "CALLSHEET_WORKFLOWS", default_value = "workflows")]
        workflows_root: PathBuf,
    },

    /// Scaffold a starter mapping, dispatcher config and workflow tree
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            config,
            workflows_root,
            format,
        } => validate_tree(&config, &workflows_root, &format),
        Commands::Tasks {
            config,
            workflows_root,
        } => list_tasks(&config, &workflows_root),
        Commands::Tiers {
            task_type,
            config,
            workflows_root,
        } => show_tiers(&task_type, &config, &workflows_root),
        Commands::Resolve {
            task_type,
            tier,
            params,
            format,
            config,
            workflows_root,
        } => resolve_selection(
            &task_type,
            &tier,
            params.as_deref(),
            &format,
            &config,
            &workflows_root,
        ),
        Commands::Init { dir } => init_tree(&dir),
    }
}

fn open_registry(config: &Path, workflows_root: &Path) -> anyhow::Result<QualityRegistry> {
    QualityRegistry::load(config, workflows_root)
        .with_context(|| format!("Failed to load quality mapping from {}", config.display()))
}

fn validate_tree(config: &Path, workflows_root: &Path, format: &str) -> anyhow::Result<()> {
    let registry = open_registry(config, workflows_root)?;
    let report = registry.validate();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_ok() {
            bail!("{} bundle issue(s) found", report.issues.len());
        }
        return Ok(());
    }

    println!(
        "Checked {} task(s), {} bundle(s) ok",
        report.tasks, report.bundles_ok
    );
    if report.is_ok() {
        println!("✓ All workflow bundles are present");
        return Ok(());
    }

    println!();
    println!("{:<18} {:<10} {:<28} Issue", "Task", "Tier", "Workflow");
    println!("{}", "-".repeat(80));
    for issue in &report.issues {
        println!(
            "{:<18} {:<10} {:<28} {}",
            issue.task_type, issue.quality_tier, issue.workflow_path, issue.issue
        );
    }
    bail!("{} bundle issue(s) found", report.issues.len())
}

fn list_tasks(config: &Path, workflows_root: &Path) -> anyhow::Result<()> {
    let registry = open_registry(config, workflows_root)?;
    let tasks = registry.task_types();

    if tasks.is_empty() {
        println!("No task types configured");
        return Ok(());
    }

    println!("Configured task types ({}):", tasks.len());
    for task in tasks {
        println!("  - {}", task);
    }
    Ok(())
}

fn show_tiers(task_type: &str, config: &Path, workflows_root: &Path) -> anyhow::Result<()> {
    let task: TaskType = task_type.parse()?;
    let registry = open_registry(config, workflows_root)?;
    let tiers = registry.tiers_for(task)?;

    println!("Quality tiers for {}:", task);
    println!();
    println!("{:<10} {:<28} Description", "Tier", "Workflow");
    println!("{}", "-".repeat(72));
    for tier in &tiers {
        println!(
            "{:<10} {:<28} {}",
            tier.quality_tier, tier.workflow_path, tier.description
        );
    }

    println!();
    for tier in &tiers {
        if tier.parameters.is_empty() {
            continue;
        }
        println!(
            "{} defaults: {}",
            tier.quality_tier,
            serde_json::to_string(&tier.parameters)?
        );
    }
    Ok(())
}

fn resolve_selection(
    task_type: &str,
    tier: &str,
    params: Option<&str>,
    format: &str,
    config: &Path,
    workflows_root: &Path,
) -> anyhow::Result<()> {
    let task: TaskType = task_type.parse()?;
    let tier: QualityTier = tier.parse()?;

    let parameters = match params {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("Parameter overrides are not valid JSON")?;
            match value {
                serde_json::Value::Object(map) => map,
                _ => bail!("Parameter overrides must be a JSON object"),
            }
        }
        None => serde_json::Map::new(),
    };

    let registry = open_registry(config, workflows_root)?;
    let request = SelectionRequest {
        task_type: task,
        quality_tier: tier,
        parameters,
    };
    let selection = registry.resolve(&request)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    println!(
        "Selection for {} at {} quality:",
        selection.task_type, selection.quality_tier
    );
    println!("  Workflow: {}", selection.workflow_path.display());
    println!("  {}", selection.description);

    if !selection.adjustments.is_empty() {
        println!();
        for adj in &selection.adjustments {
            println!(
                "⚠ {}: requested {}, raised to the minimum {}",
                adj.parameter, adj.requested, adj.minimum
            );
        }
    }

    println!();
    println!("Parameters:");
    for (key, value) in &selection.parameters {
        println!("  {} = {}", key, value);
    }
    Ok(())
}

/// Starter mapping written by `callsheet init`
const STARTER_MAPPING: &str = r#"# Quality tier to workflow mapping.
# Every task type needs all three tiers: low, standard, high.
version: 1

constraints:
  floors:
    steps: 10

tasks:
  text_to_image:
    low:
      workflow_path: image/draft
      description: Fast draft stills for layout checks
      parameters:
        steps: 12
        width: 768
        height: 432
    standard:
      workflow_path: image/standard
      description: Production stills
      parameters:
        steps: 25
        width: 1280
        height: 720
    high:
      workflow_path: image/final
      description: Final quality renders
      parameters:
        steps: 40
        width: 1920
        height: 1080

  image_to_video:
    low:
      workflow_path: video/draft
      description: Quick motion previews
      parameters:
        steps: 15
        frames: 49
    standard:
      workflow_path: video/standard
      description: Production clips
      parameters:
        steps: 30
        frames: 81
    high:
      workflow_path: video/final
      description: Final quality clips
      parameters:
        steps: 50
        frames: 121
"#;

/// Starter dispatcher config written by `callsheet init`
const DISPATCHER_TOML: &str = r#"[server]
name = "callsheet-dispatcher"
host = "127.0.0.1"
port = 8750

[quality]
mapping_path = "config/quality.yaml"
workflows_root = "workflows"
validate_on_start = true

[events]
buffer_capacity = 256
"#;

/// Empty ComfyUI export, replaced by a real workflow graph
const WORKFLOW_TEMPLATE: &str = r#"{
  "last_node_id": 0,
  "last_link_id": 0,
  "nodes": [],
  "links": [],
  "version": 0.4
}
"#;

const STARTER_BUNDLES: [&str; 6] = [
    "image/draft",
    "image/standard",
    "image/final",
    "video/draft",
    "video/standard",
    "video/final",
];

fn init_tree(dir: &Path) -> anyhow::Result<()> {
    let config_dir = dir.join("config");
    let mapping_path = config_dir.join("quality.yaml");
    if mapping_path.exists() {
        bail!("{} already exists, not overwriting", mapping_path.display());
    }

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    fs::write(&mapping_path, STARTER_MAPPING)
        .with_context(|| format!("Failed to write {}", mapping_path.display()))?;
    println!("✓ Created {}", mapping_path.display());

    let dispatcher_path = config_dir.join("dispatcher.toml");
    if dispatcher_path.exists() {
        println!("  {} already exists, left untouched", dispatcher_path.display());
    } else {
        fs::write(&dispatcher_path, DISPATCHER_TOML)
            .with_context(|| format!("Failed to write {}", dispatcher_path.display()))?;
        println!("✓ Created {}", dispatcher_path.display());
    }

    let workflows_root = dir.join("workflows");
    for rel in STARTER_BUNDLES {
        let bundle_dir = workflows_root.join(rel);
        fs::create_dir_all(&bundle_dir)
            .with_context(|| format!("Failed to create {}", bundle_dir.display()))?;
        fs::write(bundle_dir.join(WORKFLOW_FILE), WORKFLOW_TEMPLATE)?;
        let manifest = format!(
            "name: {rel}\ndescription: Starter bundle, replace workflow.json with a ComfyUI export\ninputs:\n  - prompt\n"
        );
        fs::write(bundle_dir.join(MANIFEST_FILE), manifest)?;
    }
    println!(
        "✓ Created {} workflow bundle(s) under {}",
        STARTER_BUNDLES.len(),
        workflows_root.display()
    );

    println!("\nNext steps:");
    println!("  callsheet validate");
    println!("  callsheet resolve text_to_image standard");
    println!("  dispatcher-server");
    Ok(())
}
