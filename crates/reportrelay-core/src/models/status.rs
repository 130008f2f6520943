use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub timestamp: DateTime<Local>,
    pub company: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_upload: Option<String>,
}

/// Response of the browser upload form; always delivered with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUploadResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl WebUploadResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }
}
