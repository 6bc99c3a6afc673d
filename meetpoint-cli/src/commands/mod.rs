pub mod decode;
pub mod encode;
pub mod midpoint;

use anyhow::{Context, Result};
use meetpoint::{GoogleConfig, MeetingPlanner, MeetingPlannerBuilder, TravelMode};

/// Planner settings collected from global flags and the environment.
pub struct PlannerOptions {
    pub api_key: Option<String>,
    pub mode: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub cache_size: u64,
    pub offline: bool,
}

impl PlannerOptions {
    /// Whether the Google Maps backend should be used.
    fn use_google(&self) -> bool {
        !self.offline
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Build the planner: Google-backed when an API key is available, offline
/// otherwise.
pub fn build_planner(options: &PlannerOptions) -> Result<MeetingPlanner> {
    let mut builder = MeetingPlannerBuilder::new().cache_size(options.cache_size);

    if options.use_google() {
        let mode: TravelMode = options
            .mode
            .parse()
            .with_context(|| format!("Invalid travel mode '{}'", options.mode))?;
        let api_key = options.api_key.clone().unwrap_or_default();

        builder = builder.google(
            GoogleConfig::new(api_key)
                .with_mode(mode)
                .with_timeout(options.timeout_secs)
                .with_max_retries(options.max_retries),
        );
    }

    let planner = builder.build().context("Failed to create meeting planner")?;
    tracing::debug!(backend = planner.backend(), "Planner ready");
    Ok(planner)
}
