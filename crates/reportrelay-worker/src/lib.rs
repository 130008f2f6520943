//! Weekly relay of the configured report file.

pub mod job;
pub mod next_run;
pub mod scheduler;

pub use job::{RelayFileJob, ScheduledJob};
pub use next_run::next_run;
pub use scheduler::{Scheduler, SchedulerHandle, DEFAULT_RETRY_DELAY};
