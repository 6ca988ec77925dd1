//! Aggregate performance over cached generation results

use crate::generation::config::HintThresholds;
use crate::generation::types::GenerationResult;
use serde::{Deserialize, Serialize};

/// Performance summary of the results currently cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceMetrics {
    /// Results of any status
    pub total_results: usize,
    pub completed: usize,
    pub failed: usize,
    /// Mean over completed results, 0 when none
    pub average_processing_time_ms: f64,
    /// Mean over completed results, 0 when none
    pub average_quality_score: f64,
    /// Sum over completed results
    pub total_cost: f64,
    /// completed / total, 0 when there are no results
    pub completion_ratio: f64,
}

impl PerformanceMetrics {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a GenerationResult>,
    {
        let mut metrics = Self::default();
        let mut processing_sum = 0.0;
        let mut quality_sum = 0.0;

        for result in results {
            metrics.total_results += 1;
            if result.is_failed() {
                metrics.failed += 1;
            }
            if result.is_completed() {
                metrics.completed += 1;
                processing_sum += result.processing_time_ms as f64;
                quality_sum += result.quality_score;
                metrics.total_cost += result.actual_cost;
            }
        }

        if metrics.completed > 0 {
            let completed = metrics.completed as f64;
            metrics.average_processing_time_ms = processing_sum / completed;
            metrics.average_quality_score = quality_sum / completed;
        }
        if metrics.total_results > 0 {
            metrics.completion_ratio = metrics.completed as f64 / metrics.total_results as f64;
        }

        metrics
    }

    /// Advisory strings for each breached threshold
    ///
    /// The completion-ratio check only applies once there is at least one result.
    pub fn optimization_hints(&self, thresholds: &HintThresholds) -> Vec<String> {
        let mut hints = Vec::new();

        if self.average_processing_time_ms > thresholds.slow_processing_ms {
            hints.push("Consider using faster models for non-critical generations".to_string());
        }

        if self.total_cost > thresholds.total_cost {
            hints.push("Enable intelligent caching to reduce redundant generations".to_string());
        }

        if self.total_results > 0 && self.completion_ratio < thresholds.completion_ratio {
            hints.push("Review prompts and parameters to improve success rate".to_string());
        }

        hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::provider::GenerationOutput;
    use crate::generation::types::GenerationRequest;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn completed(ms: u64, quality: f64, cost: f64) -> GenerationResult {
        GenerationResult::begin(&GenerationRequest::new("m", "p", "u"))
            .complete(
                GenerationOutput {
                    image_ref: "img".to_string(),
                    cost,
                    quality_score: quality,
                    metadata: BTreeMap::new(),
                },
                Duration::from_millis(ms),
            )
            .unwrap()
    }

    fn failed() -> GenerationResult {
        GenerationResult::begin(&GenerationRequest::new("m", "p", "u"))
            .fail("boom", Duration::ZERO)
            .unwrap()
    }

    #[test]
    fn test_empty_metrics() {
        let results: Vec<GenerationResult> = Vec::new();
        let metrics = PerformanceMetrics::from_results(&results);
        assert_eq!(metrics, PerformanceMetrics::default());
        assert!(metrics.optimization_hints(&HintThresholds::default()).is_empty());
    }

    #[test]
    fn test_aggregation() {
        let results = vec![
            completed(1_000, 0.8, 0.01),
            completed(3_000, 0.9, 0.02),
            failed(),
            GenerationResult::begin(&GenerationRequest::new("m", "p", "u")),
        ];

        let metrics = PerformanceMetrics::from_results(&results);

        assert_eq!(metrics.total_results, 4);
        assert_eq!(metrics.completed, 2);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.average_processing_time_ms, 2_000.0);
        assert!((metrics.average_quality_score - 0.85).abs() < 1e-9);
        assert!((metrics.total_cost - 0.03).abs() < 1e-9);
        assert_eq!(metrics.completion_ratio, 0.5);
    }

    #[test]
    fn test_hints_for_each_threshold() {
        let thresholds = HintThresholds::default();

        let slow = PerformanceMetrics::from_results(&[completed(12_000, 0.9, 0.01)]);
        let hints = slow.optimization_hints(&thresholds);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("faster models"));

        let expensive = PerformanceMetrics::from_results(&[completed(100, 0.9, 150.0)]);
        let hints = expensive.optimization_hints(&thresholds);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("caching"));

        let unreliable = PerformanceMetrics::from_results(&[completed(100, 0.9, 0.01), failed()]);
        let hints = unreliable.optimization_hints(&thresholds);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("success rate"));
    }

    #[test]
    fn test_healthy_metrics_have_no_hints() {
        let metrics = PerformanceMetrics::from_results(&[completed(2_000, 0.9, 0.01)]);
        assert!(metrics.optimization_hints(&HintThresholds::default()).is_empty());
    }
}
