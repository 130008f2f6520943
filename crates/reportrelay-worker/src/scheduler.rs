use crate::job::ScheduledJob;
use crate::next_run::next_run;
use chrono::{DateTime, Local};
use reportrelay_core::ScheduleConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Wait before re-reading an unparseable schedule.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// Fires a [`ScheduledJob`] once per week at the configured slot.
pub struct Scheduler {
    schedule: ScheduleConfig,
    job: Arc<dyn ScheduledJob>,
    retry_delay: Duration,
}

impl Scheduler {
    pub fn new(schedule: ScheduleConfig, job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            schedule,
            job,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Start the loop on the runtime. Dropping the handle also stops it.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            time_of_day = %self.schedule.time_of_day(),
            weekday = %self.schedule.weekday(),
            "Report scheduler started"
        );

        let mut last_fired: Option<DateTime<Local>> = None;

        loop {
            let (wait, slot) = match self.schedule.parse_time_of_day() {
                Ok(at) => {
                    let weekday = self.schedule.weekday();
                    let now = Local::now();
                    let mut slot = next_run(&now, at, weekday);
                    // A slot fires once even if the job finished inside it.
                    if last_fired == Some(slot) {
                        slot = next_run(&(slot + chrono::Duration::seconds(1)), at, weekday);
                    }
                    let wait = (slot - now).to_std().unwrap_or(Duration::ZERO);
                    tracing::info!(
                        next_upload = %slot.format("%Y-%m-%d %H:%M:%S"),
                        "Next scheduled upload"
                    );
                    (wait, Some(slot))
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        retry_in_secs = self.retry_delay.as_secs(),
                        "Invalid schedule, retrying later"
                    );
                    (self.retry_delay, None)
                }
            };

            tokio::select! {
                _ = sleep(wait) => {
                    let Some(slot) = slot else { continue };
                    last_fired = Some(slot);
                    if let Err(e) = self.job.run().await {
                        tracing::error!(error = %format!("{e:#}"), "Scheduled job failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Report scheduler shutting down");
                    break;
                }
            }
        }
    }
}

/// Stop handle for a running [`Scheduler`].
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop and wait for it to exit. A job already running is
    /// allowed to finish first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
