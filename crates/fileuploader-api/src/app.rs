//! Application builder and server runner.

use std::time::Duration;

use axum::Router;
use tokio::sync::watch;

use fileuploader_core::config::AppConfig;
use fileuploader_core::config::maintenance::MaintenanceConfig;
use fileuploader_core::error::{AppError, ErrorKind};
use fileuploader_storage::chunked::StaleChunkSweeper;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the upload server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FileUploader server...");

    create_directories(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = config.maintenance.chunk_sweep_enabled.then(|| {
        let sweeper = StaleChunkSweeper::new(&config.upload.upload_dir);
        let maintenance = config.maintenance.clone();
        tokio::spawn(run_sweeper(sweeper, maintenance, shutdown_rx))
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;

    tracing::info!(addr = %addr, "FileUploader server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
    tracing::info!("FileUploader server stopped");
    Ok(())
}

/// Periodically delete abandoned chunk files until shutdown.
async fn run_sweeper(
    sweeper: StaleChunkSweeper,
    config: MaintenanceConfig,
    mut cancel: watch::Receiver<bool>,
) {
    let max_age = Duration::from_secs(config.chunk_max_age_seconds);
    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds.max(1)));

    tracing::info!(
        interval_seconds = config.sweep_interval_seconds,
        max_age_seconds = config.chunk_max_age_seconds,
        "Stale chunk sweep started"
    );

    loop {
        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                if let Err(e) = sweeper.sweep(max_age).await {
                    tracing::warn!(error = %e, "Stale chunk sweep failed");
                }
            }
        }
    }

    tracing::info!("Stale chunk sweep stopped");
}

async fn create_directories(config: &AppConfig) -> Result<(), AppError> {
    let mut dirs = vec![config.upload.upload_dir.clone()];
    dirs.extend(config.server.temp_dir.clone());

    for dir in &dirs {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create dir '{}'", dir.display()),
                e,
            )
        })?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
