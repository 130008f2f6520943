use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Local;
use reportrelay_core::{Config, ServerStatus};
use reportrelay_worker::next_run;
use std::sync::Arc;

pub const NEXT_UPLOAD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Server status with the next scheduled upload, if any.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ServerStatus> {
    Json(ServerStatus {
        status: "running".to_string(),
        timestamp: Local::now(),
        company: state.config.company_name().to_string(),
        login: state.config.auth_login().to_string(),
        next_upload: next_upload(&state.config),
    })
}

fn next_upload(config: &Config) -> Option<String> {
    let schedule = config.schedule()?;
    let at = schedule.parse_time_of_day().ok()?;
    let next = next_run(&Local::now(), at, schedule.weekday());
    Some(next.format(NEXT_UPLOAD_FORMAT).to_string())
}
