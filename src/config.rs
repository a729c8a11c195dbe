//! Tunable pipeline parameters, with thresholds calibrated via the
//! accompanying `Default` implementation.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_cycle_length: usize,
    pub min_cycle_length: usize,
    pub processing_time_limit_seconds: f64,
    pub smurfing_threshold_amount: f64,
    pub smurfing_min_splits: usize,
    pub shell_min_layer_depth: usize,
    pub circular_max_total_amount: f64,
}

impl PipelineConfig {
    pub fn budget_duration(&self) -> Duration {
        Duration::from_secs_f64(self.processing_time_limit_seconds.max(0.0))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: 7,
            min_cycle_length: 3,
            processing_time_limit_seconds: 25.0,
            smurfing_threshold_amount: 10_000.0,
            smurfing_min_splits: 5,
            shell_min_layer_depth: 3,
            circular_max_total_amount: 500_000.0,
        }
    }
}
