use thiserror::Error;

/// Failure of a single exchange with the remote endpoint.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("request to remote endpoint failed: {0}")]
    TransportFailed(#[source] reqwest::Error),

    #[error("failed to read remote response body: {0}")]
    ReadBodyFailed(#[source] reqwest::Error),

    #[error("failed to decode remote response (HTTP {status}): {source}")]
    DecodeFailed {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UploadError {
    /// Whether the exchange failed before a response body was decoded.
    pub fn is_transport(&self) -> bool {
        !matches!(self, UploadError::DecodeFailed { .. })
    }
}
