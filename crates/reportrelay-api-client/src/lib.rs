//! HTTP client for the remote report endpoint.
//!
//! Builds a fixed-boundary multipart body (see [`multipart`]), posts it in a
//! single exchange and decodes the JSON answer into an
//! [`UploadResult`](reportrelay_core::UploadResult).

pub mod client;
pub mod error;
pub mod multipart;

pub use client::{decode_response, UploadClient, USER_AGENT};
pub use error::UploadError;
pub use multipart::{content_type, generated_file_name, MULTIPART_BOUNDARY};
