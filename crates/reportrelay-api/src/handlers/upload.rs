//! `POST /api/upload` and `POST /api/web-upload`.
//!
//! Both read the same multipart form (`password`, `file`) and run the relay
//! pipeline. The API variant answers with the remote result or an
//! `ErrorResponse`; the web variant always answers 200 with a
//! `WebUploadResult` the browser form can display.

use crate::auth::{header_password, verify_admin_password};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use reportrelay_core::{AppError, ErrorMetadata, UploadResult, WebUploadResult};
use reportrelay_processing::FileNaming;
use std::sync::Arc;

pub const FILE_FIELD: &str = "file";
pub const PASSWORD_FIELD: &str = "password";
pub const REQUIRED_EXTENSION: &str = ".csv";

/// Fields of an upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub password: Option<String>,
    pub file_name: Option<String>,
    /// At most `max + 1` bytes; anything beyond is discarded.
    pub file_bytes: Option<Vec<u8>>,
}

/// Read the form, keeping at most `max_file_size + 1` bytes of the file so an
/// oversized upload is still recognised as too large by the validator.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let keep = max_file_size.saturating_add(1);

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            PASSWORD_FIELD => {
                let value = field.text().await.map_err(multipart_error)?;
                form.password = Some(value);
            }
            FILE_FIELD => {
                if form.file_bytes.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                form.file_name = field.file_name().map(base_name);

                let mut data = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    let room = keep.saturating_sub(data.len());
                    data.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                form.file_bytes = Some(data);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
    }
}

// Some browsers send the client-side path; only the last component is kept.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}

fn has_csv_extension(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(REQUIRED_EXTENSION)
}

/// Authenticate and extract a `.csv` file from the form.
fn checked_file(
    state: &AppState,
    headers: &HeaderMap,
    form: UploadForm,
) -> Result<(String, Vec<u8>), AppError> {
    let from_header = header_password(headers);
    verify_admin_password(
        state.config.admin_password(),
        from_header.as_deref(),
        form.password.as_deref(),
    )?;

    let bytes = form
        .file_bytes
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let file_name = form.file_name.unwrap_or_default();

    if !has_csv_extension(&file_name) {
        return Err(AppError::InvalidInput(
            "Only CSV files can be uploaded".to_string(),
        ));
    }

    Ok((file_name, bytes))
}

/// Relay an uploaded report under a generated name and return the remote result.
pub async fn api_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResult>, HttpAppError> {
    let form = read_upload_form(multipart, state.pipeline.validator().max_file_size()).await?;
    let (file_name, bytes) = checked_file(&state, &headers, form)?;

    tracing::info!(file_name = %file_name, size = bytes.len(), "API upload received");

    let result = state
        .pipeline
        .relay_bytes(bytes, FileNaming::Generated)
        .await?;

    Ok(Json(result))
}

/// Browser variant: keeps the original file name, always answers 200.
pub async fn web_upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Json<WebUploadResult> {
    match relay_web_upload(&state, &headers, multipart).await {
        Ok(result) => {
            // Records accompany refusals too; only a success is summarised.
            let details = result
                .status
                .then(|| result.last_record())
                .flatten()
                .map(|record| {
                    format!(
                        "File uploaded: {} ({})",
                        record.original_name, record.date_time
                    )
                });
            Json(WebUploadResult {
                success: result.status,
                message: result.message,
                details,
            })
        }
        Err(HttpAppError(err)) => {
            tracing::warn!(error = %err, error_type = err.error_type(), "Web upload failed");
            Json(WebUploadResult::failure(err.client_message()))
        }
    }
}

async fn relay_web_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
) -> Result<UploadResult, HttpAppError> {
    let form = read_upload_form(multipart, state.pipeline.validator().max_file_size()).await?;
    let (file_name, bytes) = checked_file(state, headers, form)?;

    tracing::info!(file_name = %file_name, size = bytes.len(), "Web upload received");

    let result = state
        .pipeline
        .relay_bytes(bytes, FileNaming::Original(file_name))
        .await?;
    Ok(result)
}
