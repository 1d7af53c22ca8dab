//! Dispatcher server binary
//!
//! Standalone server exposing the quality dispatch REST API and the
//! real-time UI event WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;

use dispatcher::api::routes::{create_router, AppState};
use dispatcher::api::ws::EventBus;
use dispatcher::config::DispatcherConfig;
use quality::QualityRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing/logging
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("Loading dispatcher configuration...");
    let config = DispatcherConfig::load()?;
    tracing::info!("Mapping file: {}", config.quality.mapping_path.display());
    tracing::info!("Workflows root: {}", config.quality.workflows_root.display());

    // Load the quality mapping
    let registry = Arc::new(QualityRegistry::load(
        &config.quality.mapping_path,
        &config.quality.workflows_root,
    )?);

    // Check every configured bundle before accepting traffic
    if config.quality.validate_on_start {
        let report = registry.validate();
        if report.is_ok() {
            tracing::info!("Validated {} workflow bundle(s)", report.bundles_ok);
        } else {
            for issue in &report.issues {
                tracing::error!(
                    "{}/{} at {}: {}",
                    issue.task_type,
                    issue.quality_tier,
                    issue.workflow_path,
                    issue.issue
                );
            }
            return Err(format!(
                "{} workflow bundle(s) failed validation",
                report.issues.len()
            )
            .into());
        }
    }

    let events = EventBus::new(config.events.buffer_capacity);
    let state = AppState::new(registry, events, config.server.name.clone());

    tracing::info!("Building API router");
    let app = create_router(state);

    let addr: SocketAddr = config.bind_addr()?;
    tracing::info!("Starting dispatcher server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Dispatcher server shut down gracefully");
    Ok(())
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
