//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; anything that
//! converts into `AppError` renders with the same status, body and logging.
//! Production detail hiding is applied by the router through
//! [`redact_error_details`], which receives the flag from `Config`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reportrelay_core::{AppError, ErrorMetadata, LogLevel};
use reportrelay_processing::{RejectionReason, RelayError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so `AppError` (from reportrelay-core) can implement `IntoResponse`.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<RejectionReason> for HttpAppError {
    fn from(reason: RejectionReason) -> Self {
        HttpAppError(rejection_to_app_error(reason))
    }
}

impl From<RelayError> for HttpAppError {
    fn from(err: RelayError) -> Self {
        let app_error = match err {
            RelayError::ValidationRejected(reason) => rejection_to_app_error(reason),
            RelayError::SourceReadFailed { path, source } => {
                AppError::SourceReadFailed(format!("{}: {}", path.display(), source))
            }
            RelayError::RemoteTransportFailed(e) => AppError::RemoteTransportFailed(e.to_string()),
            RelayError::RemoteDecodeFailed(e) => AppError::RemoteDecodeFailed(e.to_string()),
        };
        HttpAppError(app_error)
    }
}

fn rejection_to_app_error(reason: RejectionReason) -> AppError {
    match reason {
        RejectionReason::FileTooLarge { .. } => AppError::PayloadTooLarge(reason.to_string()),
        other => AppError::ValidationRejected(other.to_string()),
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

/// Rendered error body, carried in the response extensions.
#[derive(Clone, Debug)]
struct RenderedError(ErrorResponse);

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let hide_details = app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: (!hide_details).then(|| app_error.detailed_message()),
            error_type: (!hide_details).then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(RenderedError(body));
        response
    }
}

/// Response mapper: with `hide` set, error bodies lose `details` and `error_type`.
pub async fn redact_error_details(
    State(hide): State<bool>,
    mut response: Response,
) -> Response {
    let Some(RenderedError(mut body)) = response.extensions_mut().remove::<RenderedError>() else {
        return response;
    };
    if !hide || (body.details.is_none() && body.error_type.is_none()) {
        return response;
    }

    body.details = None;
    body.error_type = None;
    (response.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use reportrelay_api_client::decode_response;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn status_of(err: HttpAppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_too_large_maps_to_413() {
        let err = HttpAppError::from(RelayError::ValidationRejected(
            RejectionReason::FileTooLarge { max: 10 },
        ));
        assert_eq!(status_of(err), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_other_rejections_map_to_400() {
        let err = HttpAppError::from(RejectionReason::EmptyFile);
        assert!(matches!(err.0, AppError::ValidationRejected(_)));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_remote_failures_map_to_502() {
        let decode = decode_response(200, b"<html>").unwrap_err();
        let err = HttpAppError::from(RelayError::from(decode));
        assert!(matches!(err.0, AppError::RemoteDecodeFailed(_)));
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let err = HttpAppError::from(AppError::Unauthorized("nope".to_string()));
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_details_shown_outside_production() {
        let err = HttpAppError::from(AppError::Unauthorized("bad password".to_string()));
        let response = redact_error_details(State(false), err.into_response()).await;

        let body = body_of(response).await;
        assert_eq!(body.error_type.as_deref(), Some("Unauthorized"));
        assert!(body.details.unwrap().contains("bad password"));
    }

    #[tokio::test]
    async fn test_production_hides_details() {
        let err = HttpAppError::from(AppError::Unauthorized("bad password".to_string()));
        let response = redact_error_details(State(true), err.into_response()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_of(response).await;
        assert_eq!(body.code, "UNAUTHORIZED");
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
    }

    #[tokio::test]
    async fn test_non_error_responses_pass_through() {
        let response = (StatusCode::OK, "fine").into_response();
        let response = redact_error_details(State(true), response).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
