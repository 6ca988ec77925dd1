//! Configuration for request scheduling

use crate::generation::catalog::ModelCategory;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits that trigger cost-optimization hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintThresholds {
    /// Mean processing time above which a faster tier is suggested
    pub slow_processing_ms: f64,

    /// Cumulative cost above which caching is suggested
    pub total_cost: f64,

    /// Completion ratio below which input review is suggested
    pub completion_ratio: f64,
}

impl Default for HintThresholds {
    fn default() -> Self {
        Self {
            slow_processing_ms: 10_000.0,
            total_cost: 100.0,
            completion_ratio: 0.9,
        }
    }
}

/// Configuration for the request scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the queue is drained
    pub drain_interval: Duration,

    /// Minimum time between two dispatches
    pub min_dispatch_interval: Duration,

    /// How long a failed result stays visible to status polling
    pub failed_result_ttl: Duration,

    /// Upper bound on a single provider call; `None` waits indefinitely
    pub generation_timeout: Option<Duration>,

    /// Category used when a request does not name one
    pub default_category: ModelCategory,

    pub hint_thresholds: HintThresholds,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(1),
            min_dispatch_interval: Duration::from_millis(500),
            failed_result_ttl: Duration::from_secs(300),
            generation_timeout: None,
            default_category: ModelCategory::Photography,
            hint_thresholds: HintThresholds::default(),
        }
    }
}

impl SchedulerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.drain_interval.is_zero() {
            return Err("drain_interval must be greater than 0".to_string());
        }

        if self.failed_result_ttl.is_zero() {
            return Err("failed_result_ttl must be greater than 0".to_string());
        }

        if matches!(self.generation_timeout, Some(t) if t.is_zero()) {
            return Err("generation_timeout must be greater than 0 when set".to_string());
        }

        let ratio = self.hint_thresholds.completion_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err("hint_thresholds.completion_ratio must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}
