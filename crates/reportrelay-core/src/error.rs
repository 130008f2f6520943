//! Error types module
//!
//! All failures that reach the HTTP layer are unified under `AppError`. Each
//! variant self-describes how it is presented through `ErrorMetadata`.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like rejected files
    Debug,
    /// Warning level - for remote endpoint trouble
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VALIDATION_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("File rejected: {0}")]
    ValidationRejected(String),

    #[error("Failed to read source file: {0}")]
    SourceReadFailed(String),

    #[error("Remote endpoint unreachable: {0}")]
    RemoteTransportFailed(String),

    #[error("Remote endpoint returned an undecodable response: {0}")]
    RemoteDecodeFailed(String),
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check the admin password"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::ValidationRejected(_) => (
            400,
            "VALIDATION_REJECTED",
            false,
            Some("Remove the flagged content and upload again"),
            false,
            LogLevel::Debug,
        ),
        AppError::SourceReadFailed(_) => (
            500,
            "SOURCE_READ_FAILED",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::RemoteTransportFailed(_) => (
            502,
            "REMOTE_TRANSPORT_FAILED",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Warn,
        ),
        AppError::RemoteDecodeFailed(_) => (
            502,
            "REMOTE_DECODE_FAILED",
            false,
            Some("Contact the report receiver if this error persists"),
            false,
            LogLevel::Warn,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::ValidationRejected(_) => "ValidationRejected",
            AppError::SourceReadFailed(_) => "SourceReadFailed",
            AppError::RemoteTransportFailed(_) => "RemoteTransportFailed",
            AppError::RemoteDecodeFailed(_) => "RemoteDecodeFailed",
        }
    }

    /// Internal description, shown to clients outside production.
    pub fn detailed_message(&self) -> String {
        self.to_string()
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::ValidationRejected(ref reason) => {
                format!("File failed the safety check: {}", reason)
            }
            AppError::SourceReadFailed(_) => "Failed to read the uploaded file".to_string(),
            AppError::RemoteTransportFailed(ref msg) => {
                format!("Failed to reach the report receiver: {}", msg)
            }
            AppError::RemoteDecodeFailed(_) => {
                "The report receiver returned an unexpected response".to_string()
            }
        }
    }
}
