//! Validate-then-relay pipeline shared by the HTTP handlers and the scheduler.

use crate::validator::{ContentValidator, RejectionReason};
use async_trait::async_trait;
use chrono::Local;
use reportrelay_api_client::{generated_file_name, UploadClient, UploadError};
use reportrelay_core::{Config, UploadRequest, UploadResult};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Sink for accepted reports.
#[async_trait]
pub trait ReportUploader: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError>;
}

#[async_trait]
impl ReportUploader for UploadClient {
    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        self.send(&request).await
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("report rejected: {0}")]
    ValidationRejected(#[from] RejectionReason),

    #[error("failed to read report {path}: {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("remote upload failed: {0}")]
    RemoteTransportFailed(#[source] UploadError),

    #[error("remote response could not be decoded: {0}")]
    RemoteDecodeFailed(#[source] UploadError),
}

impl From<UploadError> for RelayError {
    fn from(err: UploadError) -> Self {
        if err.is_transport() {
            RelayError::RemoteTransportFailed(err)
        } else {
            RelayError::RemoteDecodeFailed(err)
        }
    }
}

/// Outbound file name policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNaming {
    /// `ir_<login>_<YYYYMMDD_HHMMSS>.csv`, local time of the relay.
    Generated,
    /// Keep the caller-supplied name (browser uploads).
    Original(String),
}

impl FileNaming {
    fn resolve(&self, auth_login: &str) -> String {
        match self {
            FileNaming::Generated => generated_file_name(auth_login, &Local::now()),
            FileNaming::Original(name) => name.clone(),
        }
    }
}

/// Runs the content check and forwards accepted reports.
///
/// Nothing reaches the uploader unless the validator accepted it.
#[derive(Clone)]
pub struct RelayPipeline {
    validator: ContentValidator,
    uploader: Arc<dyn ReportUploader>,
    auth_login: String,
    auth_token: String,
}

impl RelayPipeline {
    pub fn new(
        validator: ContentValidator,
        uploader: Arc<dyn ReportUploader>,
        auth_login: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            validator,
            uploader,
            auth_login: auth_login.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Pipeline wired to the remote endpoint named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        let client = UploadClient::from_config(config)?;
        let validator =
            ContentValidator::new(config.max_file_size_bytes(), config.validation_mode());
        Ok(Self::new(
            validator,
            Arc::new(client),
            config.auth_login(),
            config.auth_token(),
        ))
    }

    pub fn validator(&self) -> &ContentValidator {
        &self.validator
    }

    pub fn auth_login(&self) -> &str {
        &self.auth_login
    }

    pub async fn relay_bytes(
        &self,
        content: Vec<u8>,
        naming: FileNaming,
    ) -> Result<UploadResult, RelayError> {
        let relay_id = Uuid::new_v4();

        if let Err(reason) = self.validator.validate_bytes(&content).into_result() {
            tracing::warn!(
                relay_id = %relay_id,
                size = content.len(),
                reason = %reason,
                "Report rejected by content check"
            );
            return Err(reason.into());
        }

        let file_name = naming.resolve(&self.auth_login);
        tracing::info!(
            relay_id = %relay_id,
            file_name = %file_name,
            size = content.len(),
            "Relaying report"
        );

        let request = UploadRequest::new(
            content,
            file_name,
            self.auth_login.as_str(),
            self.auth_token.as_str(),
        );

        let result = self.uploader.upload(request).await.map_err(|e| {
            tracing::error!(relay_id = %relay_id, error = %e, "Remote upload failed");
            RelayError::from(e)
        })?;

        match result.last_record() {
            Some(record) => tracing::info!(
                relay_id = %relay_id,
                status = result.status,
                code = result.code,
                last_upload_at = %record.date_time,
                last_upload_name = %record.original_name,
                "Remote endpoint answered"
            ),
            None => tracing::info!(
                relay_id = %relay_id,
                status = result.status,
                code = result.code,
                message = %result.message,
                "Remote endpoint answered"
            ),
        }

        Ok(result)
    }

    /// Read a report from disk and relay it. At most one byte past the size
    /// cap is read so oversized files are still rejected as too large.
    pub async fn relay_file(
        &self,
        path: impl AsRef<Path>,
        naming: FileNaming,
    ) -> Result<UploadResult, RelayError> {
        let path = path.as_ref();
        let content = read_bounded(path, self.validator.max_file_size())
            .await
            .map_err(|source| RelayError::SourceReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        self.relay_bytes(content, naming).await
    }
}

async fn read_bounded(path: &Path, max: usize) -> io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut content = Vec::new();
    file.take(max as u64 + 1).read_to_end(&mut content).await?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportrelay_core::{UploadRecord, ValidationMode};
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingUploader {
        requests: Mutex<Vec<UploadRequest>>,
        fail_transport: bool,
    }

    #[async_trait]
    impl ReportUploader for RecordingUploader {
        async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_transport {
                // Nothing listens on port 1.
                let client =
                    UploadClient::new("http://127.0.0.1:1/api.php", Duration::from_secs(2))?;
                return client.send(&request).await;
            }
            Ok(UploadResult {
                status: true,
                code: 0,
                message: "ok".to_string(),
                records: vec![UploadRecord {
                    date_time: "2024-01-01 09:00".to_string(),
                    original_name: "report.csv".to_string(),
                }],
            })
        }
    }

    fn pipeline(uploader: Arc<RecordingUploader>, max: usize) -> RelayPipeline {
        RelayPipeline::new(
            ContentValidator::new(max, ValidationMode::Standard),
            uploader,
            "5700097",
            "secret",
        )
    }

    #[tokio::test]
    async fn test_accepted_report_is_forwarded_with_credentials() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 1024);

        let result = pipeline
            .relay_bytes(
                b"date,qty\n2024-01-01,4\n".to_vec(),
                FileNaming::Original("report.csv".to_string()),
            )
            .await
            .unwrap();

        assert!(result.status);
        let requests = uploader.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].file_name(), "report.csv");
        assert_eq!(requests[0].auth_login(), "5700097");
        assert_eq!(requests[0].auth_token(), "secret");
        assert_eq!(requests[0].file_bytes(), b"date,qty\n2024-01-01,4\n");
    }

    #[tokio::test]
    async fn test_rejected_report_never_reaches_uploader() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 1024);

        let err = pipeline
            .relay_bytes(b"name\n<script>x</script>\n".to_vec(), FileNaming::Generated)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::ValidationRejected(RejectionReason::DangerousPattern { .. })
        ));
        assert!(uploader.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_name_uses_login() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 1024);

        pipeline
            .relay_bytes(b"a,b\n".to_vec(), FileNaming::Generated)
            .await
            .unwrap();

        let requests = uploader.requests.lock().unwrap();
        let name = requests[0].file_name();
        assert!(name.starts_with("ir_5700097_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "ir_5700097_20240101_090000.csv".len());
    }

    #[tokio::test]
    async fn test_uploader_failure_maps_to_transport_error() {
        let uploader = Arc::new(RecordingUploader {
            fail_transport: true,
            ..Default::default()
        });
        let pipeline = pipeline(uploader, 1024);

        let err = pipeline
            .relay_bytes(b"a,b\n".to_vec(), FileNaming::Generated)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::RemoteTransportFailed(UploadError::TransportFailed(_))
        ));
    }

    #[test]
    fn test_decode_failure_maps_to_decode_error() {
        let upload_err = reportrelay_api_client::decode_response(200, b"nope").unwrap_err();
        assert!(matches!(
            RelayError::from(upload_err),
            RelayError::RemoteDecodeFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_relay_file_reads_from_disk() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 1024);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"sku,qty\nA1,3\n").unwrap();

        pipeline
            .relay_file(file.path(), FileNaming::Generated)
            .await
            .unwrap();

        let requests = uploader.requests.lock().unwrap();
        assert_eq!(requests[0].file_bytes(), b"sku,qty\nA1,3\n");
    }

    #[tokio::test]
    async fn test_relay_file_oversized_is_rejected() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 8);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'a'; 64]).unwrap();

        let err = pipeline
            .relay_file(file.path(), FileNaming::Generated)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::ValidationRejected(RejectionReason::FileTooLarge { max: 8 })
        ));
        assert!(uploader.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relay_file_missing_is_read_failure() {
        let uploader = Arc::new(RecordingUploader::default());
        let pipeline = pipeline(uploader.clone(), 1024);
        let dir = tempfile::tempdir().unwrap();

        let err = pipeline
            .relay_file(dir.path().join("absent.csv"), FileNaming::Generated)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::SourceReadFailed { .. }));
        assert!(uploader.requests.lock().unwrap().is_empty());
    }
}
