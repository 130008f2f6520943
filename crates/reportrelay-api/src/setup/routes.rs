//! Route configuration and setup

use crate::error::redact_error_details;
use crate::handlers::{status, upload, web_form};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::map_response_with_state,
    routing::{get, post},
    Router,
};
use reportrelay_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart headers and the password field on top of the file cap.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = config.http_concurrency_limit();

    let body_limit = state
        .pipeline
        .validator()
        .max_file_size()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    tracing::debug!(
        http_concurrency_limit,
        body_limit,
        static_dir = %config.static_dir(),
        "Configuring routes"
    );

    let app = Router::new()
        .route("/", get(web_form::render_form))
        .route("/api/status", get(status::get_status))
        .route("/api/upload", post(upload::api_upload))
        .route("/api/web-upload", post(upload::web_upload))
        .nest_service("/static", ServeDir::new(config.static_dir()))
        .layer(map_response_with_state(
            config.is_production(),
            redact_error_details,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
