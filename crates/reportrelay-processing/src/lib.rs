//! Content safety validation and the relay pipeline.
//!
//! [`ContentValidator`] screens report bytes; [`RelayPipeline`] runs the
//! validator and, only on acceptance, hands the bytes to a [`ReportUploader`].

pub mod pipeline;
pub mod validator;

pub use pipeline::{FileNaming, RelayError, RelayPipeline, ReportUploader};
pub use validator::{ContentValidator, PatternCategory, RejectionReason, ValidationOutcome};
