use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A validated report ready to be relayed to the remote endpoint.
///
/// Built by the relay pipeline only after the validator accepted the bytes,
/// and dropped once the HTTP exchange completes.
#[derive(Clone)]
pub struct UploadRequest {
    file_bytes: Vec<u8>,
    file_name: String,
    auth_login: String,
    auth_token: String,
}

impl UploadRequest {
    pub fn new(
        file_bytes: Vec<u8>,
        file_name: impl Into<String>,
        auth_login: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            file_bytes,
            file_name: file_name.into(),
            auth_login: auth_login.into(),
            auth_token: auth_token.into(),
        }
    }

    pub fn file_bytes(&self) -> &[u8] {
        &self.file_bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn auth_login(&self) -> &str {
        &self.auth_login
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("file_size", &self.file_bytes.len())
            .field("auth_login", &self.auth_login)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// One accepted upload as reported by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    #[serde(rename = "datetime", default)]
    pub date_time: String,
    #[serde(default)]
    pub original_name: String,
}

/// Decoded response of the remote endpoint.
///
/// `status`, `code` and `message` are the authoritative success signal; the
/// HTTP status line of the response is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub status: bool,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "data", default, deserialize_with = "null_as_empty")]
    pub records: Vec<UploadRecord>,
}

impl UploadResult {
    /// The most recent accepted upload, if the endpoint returned any.
    pub fn last_record(&self) -> Option<&UploadRecord> {
        self.records.last()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<UploadRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<UploadRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
