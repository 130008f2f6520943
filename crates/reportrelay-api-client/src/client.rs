use crate::error::UploadError;
use crate::multipart;
use reportrelay_core::{Config, UploadRequest, UploadResult};
use reqwest::header::{CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::Client;
use std::time::Duration;

/// Browser-like agent string; the endpoint rejects unknown clients.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Client for the remote report endpoint.
#[derive(Clone, Debug)]
pub struct UploadClient {
    client: Client,
    endpoint: String,
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| UploadError::InvalidRequest(format!("bad endpoint {}: {}", endpoint, e)))?;

        // One exchange per connection; nothing is kept in the pool.
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(UploadError::TransportFailed)?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        Self::new(config.base_url(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post the report and decode the endpoint's answer.
    ///
    /// A non-2xx status is not an error by itself: the decoded `status`
    /// field decides success.
    pub async fn send(&self, request: &UploadRequest) -> Result<UploadResult, UploadError> {
        if request.file_name().is_empty() {
            return Err(UploadError::InvalidRequest(
                "file name must not be empty".to_string(),
            ));
        }

        let body = multipart::encode(request);
        tracing::debug!(
            endpoint = %self.endpoint,
            file_name = %request.file_name(),
            body_bytes = body.len(),
            "Sending report to remote endpoint"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, multipart::content_type())
            .header(USER_AGENT_HEADER, USER_AGENT)
            .body(body)
            .send()
            .await
            .map_err(UploadError::TransportFailed)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(UploadError::ReadBodyFailed)?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&bytes),
                "Remote endpoint answered with non-success status"
            );
        }

        decode_response(status.as_u16(), &bytes)
    }
}

/// Decode a raw endpoint answer.
pub fn decode_response(status: u16, body: &[u8]) -> Result<UploadResult, UploadError> {
    serde_json::from_slice(body).map_err(|source| UploadError::DecodeFailed {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::MULTIPART_BOUNDARY;
    use mockito::{Matcher, Server};

    fn request() -> UploadRequest {
        UploadRequest::new(b"a,b\n1,2\n".to_vec(), "report.csv", "5700097", "tok")
    }

    fn client_for(server: &mockito::ServerGuard) -> UploadClient {
        UploadClient::new(format!("{}/api.php", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_exact_body_and_decodes() {
        let mut server = Server::new_async().await;
        let expected_body = multipart::encode(&request());
        let mock = server
            .mock("POST", "/api.php")
            .match_header(
                "content-type",
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY).as_str(),
            )
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::Exact(String::from_utf8(expected_body).unwrap()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":true,"code":0,"message":"ok","data":[{"datetime":"2024-01-01 09:00","original_name":"report.csv"}]}"#,
            )
            .create_async()
            .await;

        let result = client_for(&server).send(&request()).await.unwrap();

        mock.assert_async().await;
        assert!(result.status);
        assert_eq!(result.message, "ok");
        assert_eq!(result.last_record().unwrap().original_name, "report.csv");
    }

    #[tokio::test]
    async fn test_non_success_status_still_decodes() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api.php")
            .with_status(500)
            .with_body(r#"{"status":false,"code":17,"message":"bad token","data":null}"#)
            .create_async()
            .await;

        let result = client_for(&server).send(&request()).await.unwrap();

        assert!(!result.status);
        assert_eq!(result.code, 17);
        assert!(result.records.is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api.php")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server).send(&request()).await.unwrap_err();

        match err {
            UploadError::DecodeFailed { status, body, .. } => {
                assert_eq!(status, 200);
                assert!(body.contains("maintenance"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let client =
            UploadClient::new("http://127.0.0.1:1/api.php", Duration::from_secs(2)).unwrap();

        let err = client.send(&request()).await.unwrap_err();

        assert!(matches!(err, UploadError::TransportFailed(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = UploadClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, UploadError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_empty_file_name_is_invalid_request() {
        let client = UploadClient::new("http://127.0.0.1:1/", Duration::from_secs(1)).unwrap();
        let request = UploadRequest::new(b"a".to_vec(), "", "l", "t");

        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, UploadError::InvalidRequest(_)));
    }

    #[test]
    fn test_decode_response_missing_status() {
        let err = decode_response(200, br#"{"code":0}"#).unwrap_err();
        assert!(!err.is_transport());
    }
}
