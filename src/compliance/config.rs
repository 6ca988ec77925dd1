//! Configuration for the compliance log and content scanning

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Legal basis reported on subject access requests
pub const DEFAULT_LEGAL_BASIS: &str = "legitimate_interest";

/// Per-category risk limits; a scan passes only when every score is below its limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyThresholds {
    pub nsfw: f64,
    pub violence: f64,
    pub bias: f64,
    pub copyright: f64,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            nsfw: 0.3,
            violence: 0.2,
            bias: 0.4,
            copyright: 0.3,
        }
    }
}

impl SafetyThresholds {
    fn all(&self) -> [(&'static str, f64); 4] {
        [
            ("nsfw", self.nsfw),
            ("violence", self.violence),
            ("bias", self.bias),
            ("copyright", self.copyright),
        ]
    }
}

/// Configuration for the compliance log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Audit entries older than this many days are pruned
    pub retention_days: u32,

    /// Prune on every `record` and on the background sweep
    pub automatic_deletion: bool,

    /// Interval of the background retention sweep
    pub retention_sweep_interval: Duration,

    /// Trailing window used by `compliance_report`
    pub report_window_days: u32,

    pub legal_basis: String,

    pub thresholds: SafetyThresholds,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            automatic_deletion: true,
            retention_sweep_interval: Duration::from_secs(3600),
            report_window_days: 30,
            legal_basis: DEFAULT_LEGAL_BASIS.to_string(),
            thresholds: SafetyThresholds::default(),
        }
    }
}

impl ComplianceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.retention_days == 0 {
            return Err("retention_days must be greater than 0".to_string());
        }

        if self.report_window_days == 0 {
            return Err("report_window_days must be greater than 0".to_string());
        }

        if self.automatic_deletion && self.retention_sweep_interval.is_zero() {
            return Err(
                "retention_sweep_interval must be greater than 0 when automatic deletion is enabled"
                    .to_string(),
            );
        }

        for (name, limit) in self.thresholds.all() {
            if !(0.0..=1.0).contains(&limit) {
                return Err(format!("{} threshold must be between 0.0 and 1.0", name));
            }
        }

        Ok(())
    }

    /// Retention window as a duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 3600)
    }
}
