//! Server startup and graceful shutdown

use crate::setup::{scheduler::start_scheduler, Application};
use anyhow::Result;
use reportrelay_core::Config;

/// Start the scheduler and the server; on shutdown stop both.
pub async fn start_server(config: &Config, app: Application) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let scheduler = start_scheduler(config, app.state.pipeline.clone());

    tracing::info!(
        max_file_size_mb = config.max_file_size_bytes() / 1024 / 1024,
        csv_file_path = %config.csv_file_path(),
        scheduled = scheduler.is_some(),
        "Server ready and accepting connections"
    );

    let served = axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    served?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// # Panics
/// Panics if a signal handler cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
