use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reportrelay_processing::{FileNaming, RelayPipeline};
use std::path::PathBuf;

/// Work performed at every scheduled slot.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Relays the report file at `path` under a generated name.
pub struct RelayFileJob {
    pipeline: RelayPipeline,
    path: PathBuf,
}

impl RelayFileJob {
    pub fn new(pipeline: RelayPipeline, path: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            path: path.into(),
        }
    }
}

#[async_trait]
impl ScheduledJob for RelayFileJob {
    async fn run(&self) -> Result<()> {
        tracing::info!(path = %self.path.display(), "Scheduled upload started");

        let result = self
            .pipeline
            .relay_file(&self.path, FileNaming::Generated)
            .await
            .with_context(|| format!("Scheduled upload of {} failed", self.path.display()))?;

        if !result.status {
            bail!(
                "Remote endpoint refused scheduled upload (code {}): {}",
                result.code,
                result.message
            );
        }

        tracing::info!(
            path = %self.path.display(),
            message = %result.message,
            "Scheduled upload completed"
        );
        Ok(())
    }
}
