//! ReportRelay Core Library
//!
//! This crate provides the configuration, error types and domain models
//! shared by the validator, the upload client, the scheduler and the API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, RelayConfig, ValidationMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ScheduleConfig, ScheduleError, ServerStatus, UploadRecord, UploadRequest, UploadResult,
    WebUploadResult,
};
