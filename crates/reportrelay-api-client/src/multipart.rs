//! Byte-exact multipart/form-data encoding for the remote endpoint.
//!
//! The endpoint expects a fixed boundary and the fields `action`,
//! `auth_login`, `auth_token` in that order, followed by the `file` part.

use chrono::{DateTime, TimeZone};
use reportrelay_core::UploadRequest;
use std::fmt::Display;

/// Boundary token used for every upload body.
pub const MULTIPART_BOUNDARY: &str = "ReportRelayBoundary7MA4YWxkTrZu0gW";

/// Value of the `action` field.
pub const UPLOAD_ACTION: &str = "upload";

/// Content type declared for the file part.
pub const FILE_CONTENT_TYPE: &str = "text/csv";

/// Value of the request `Content-Type` header.
pub fn content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}

/// Encode the request as a multipart body.
pub fn encode(request: &UploadRequest) -> Vec<u8> {
    let mut body = Vec::with_capacity(request.file_bytes().len() + 512);

    write_field(&mut body, "action", UPLOAD_ACTION);
    write_field(&mut body, "auth_login", request.auth_login());
    write_field(&mut body, "auth_token", request.auth_token());

    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            escape_quotes(request.file_name())
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", FILE_CONTENT_TYPE).as_bytes());
    body.extend_from_slice(request.file_bytes());
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    body
}

fn write_field(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            MULTIPART_BOUNDARY,
            escape_quotes(name),
            value
        )
        .as_bytes(),
    );
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Outbound name for API and scheduled uploads: `ir_<login>_<YYYYMMDD_HHMMSS>.csv`.
pub fn generated_file_name<Tz>(auth_login: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("ir_{}_{}.csv", auth_login, at.format("%Y%m%d_%H%M%S"))
}
