//! Application setup and initialization

pub mod routes;
pub mod scheduler;
pub mod server;

use crate::state::AppState;
use crate::telemetry::{init_telemetry, LogFormat};
use anyhow::{Context, Result};
use reportrelay_core::Config;
use reportrelay_processing::RelayPipeline;
use std::sync::Arc;

/// Shared state plus the router built from it.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
}

/// Validate configuration, install tracing and build the router.
pub fn initialize_app(config: Config) -> Result<Application> {
    config.validate().context("Configuration validation failed")?;

    let log_format = config
        .log_format()
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!("Invalid LOG_FORMAT: {}", e))?;
    init_telemetry(log_format, config.environment())?;

    tracing::info!(
        company = %config.company_name(),
        login = %config.auth_login(),
        endpoint = %config.base_url(),
        validation_mode = %config.validation_mode(),
        "Configuration loaded and validated successfully"
    );

    let pipeline = RelayPipeline::from_config(&config).context("Failed to build upload client")?;
    let state = Arc::new(AppState::new(config.clone(), pipeline));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok(Application { state, router })
}
