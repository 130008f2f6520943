use reportrelay_core::Config;
use reportrelay_processing::RelayPipeline;
use reportrelay_worker::{RelayFileJob, Scheduler, SchedulerHandle};
use std::sync::Arc;

/// Start the weekly upload of `CSV_FILE_PATH`, unless scheduling is disabled.
pub fn start_scheduler(config: &Config, pipeline: RelayPipeline) -> Option<SchedulerHandle> {
    let Some(schedule) = config.schedule() else {
        tracing::info!("Automatic uploads disabled");
        return None;
    };

    let job = RelayFileJob::new(pipeline, config.csv_file_path());
    Some(Scheduler::new(schedule, Arc::new(job)).spawn())
}
