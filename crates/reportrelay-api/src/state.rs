use reportrelay_core::Config;
use reportrelay_processing::RelayPipeline;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: RelayPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: RelayPipeline) -> Self {
        Self { config, pipeline }
    }
}
