pub mod schedule;
pub mod status;
pub mod upload;

pub use schedule::{ScheduleConfig, ScheduleError};
pub use status::{ServerStatus, WebUploadResult};
pub use upload::{UploadRecord, UploadRequest, UploadResult};
