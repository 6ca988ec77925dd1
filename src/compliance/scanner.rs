//! Threshold-based content safety checks
//!
//! Scoring is delegated to a [`ContentScorer`]; the pass/fail decision and the
//! flagged reasons depend only on the scores and [`SafetyThresholds`].

use crate::clock::{SharedClock, SystemClock};
use crate::compliance::config::SafetyThresholds;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const NSFW_REASON: &str = "NSFW content detected";
pub const VIOLENCE_REASON: &str = "Violence detected";
pub const BIAS_REASON: &str = "Potential bias detected";
pub const COPYRIGHT_REASON: &str = "Copyright infringement risk";

/// Risk scores for one image, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RiskScores {
    pub nsfw: f64,
    pub violence: f64,
    pub bias: f64,
    pub copyright: f64,
}

impl RiskScores {
    /// Highest of the four scores
    pub fn max(&self) -> f64 {
        self.nsfw.max(self.violence).max(self.bias).max(self.copyright)
    }

    /// Reasons for every score at or above its threshold, in fixed order
    pub fn flagged_reasons(&self, thresholds: &SafetyThresholds) -> Vec<String> {
        [
            (self.nsfw, thresholds.nsfw, NSFW_REASON),
            (self.violence, thresholds.violence, VIOLENCE_REASON),
            (self.bias, thresholds.bias, BIAS_REASON),
            (self.copyright, thresholds.copyright, COPYRIGHT_REASON),
        ]
        .into_iter()
        .filter(|(score, limit, _)| score >= limit)
        .map(|(_, _, reason)| reason.to_string())
        .collect()
    }
}

/// Produces risk scores for an image reference
#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn score(&self, image_ref: &str) -> RiskScores;
}

/// Low random scores, standing in for a classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomScorer;

#[async_trait]
impl ContentScorer for RandomScorer {
    async fn score(&self, _image_ref: &str) -> RiskScores {
        RiskScores {
            nsfw: rand::random::<f64>() * 0.1,
            violence: rand::random::<f64>() * 0.05,
            bias: rand::random::<f64>() * 0.2,
            copyright: rand::random::<f64>() * 0.1,
        }
    }
}

/// Returns the same scores for every image
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticScorer(pub RiskScores);

#[async_trait]
impl ContentScorer for StaticScorer {
    async fn score(&self, _image_ref: &str) -> RiskScores {
        self.0
    }
}

/// Outcome of scanning one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScan {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub image_ref: String,
    pub scores: RiskScores,
    pub passed: bool,
    /// Empty when the scan passed
    pub flagged_reasons: Vec<String>,
}

/// Scores images and applies the safety thresholds
pub struct ContentSafetyScanner {
    scorer: Arc<dyn ContentScorer>,
    thresholds: SafetyThresholds,
    clock: SharedClock,
}

impl ContentSafetyScanner {
    pub fn new(scorer: Arc<dyn ContentScorer>, thresholds: SafetyThresholds) -> Self {
        Self {
            scorer,
            thresholds,
            clock: SystemClock::shared(),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn thresholds(&self) -> &SafetyThresholds {
        &self.thresholds
    }

    pub async fn scan(&self, image_ref: &str) -> SecurityScan {
        let scores = self.scorer.score(image_ref).await;
        self.assess(image_ref, scores)
    }

    /// Build a scan from known scores
    pub fn assess(&self, image_ref: &str, scores: RiskScores) -> SecurityScan {
        let flagged_reasons = scores.flagged_reasons(&self.thresholds);
        let passed = flagged_reasons.is_empty();

        if passed {
            debug!("Content scan passed for {}", image_ref);
        } else {
            warn!(
                "Content scan failed for {}: {}",
                image_ref,
                flagged_reasons.join(", ")
            );
        }

        SecurityScan {
            id: format!("scan-{}", Uuid::new_v4()),
            timestamp: self.clock.now(),
            image_ref: image_ref.to_string(),
            scores,
            passed,
            flagged_reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(scores: RiskScores) -> ContentSafetyScanner {
        ContentSafetyScanner::new(Arc::new(StaticScorer(scores)), SafetyThresholds::default())
    }

    #[tokio::test]
    async fn test_clean_scan_passes() {
        let scan = scanner(RiskScores::default()).scan("img://1").await;

        assert!(scan.passed);
        assert!(scan.flagged_reasons.is_empty());
        assert_eq!(scan.image_ref, "img://1");
        assert!(scan.id.starts_with("scan-"));
    }

    #[tokio::test]
    async fn test_nsfw_above_threshold_fails() {
        let scan = scanner(RiskScores {
            nsfw: 0.35,
            ..Default::default()
        })
        .scan("img://2")
        .await;

        assert!(!scan.passed);
        assert_eq!(scan.flagged_reasons, vec![NSFW_REASON.to_string()]);
    }

    #[test]
    fn test_score_at_threshold_is_flagged() {
        let scan = scanner(RiskScores::default()).assess(
            "img://3",
            RiskScores {
                violence: 0.2,
                copyright: 0.9,
                ..Default::default()
            },
        );

        assert!(!scan.passed);
        assert_eq!(scan.flagged_reasons, vec![VIOLENCE_REASON, COPYRIGHT_REASON]);
    }

    #[test]
    fn test_all_reasons_in_order() {
        let scores = RiskScores {
            nsfw: 1.0,
            violence: 1.0,
            bias: 1.0,
            copyright: 1.0,
        };
        assert_eq!(
            scores.flagged_reasons(&SafetyThresholds::default()),
            vec![NSFW_REASON, VIOLENCE_REASON, BIAS_REASON, COPYRIGHT_REASON]
        );
        assert_eq!(scores.max(), 1.0);
    }

    #[tokio::test]
    async fn test_random_scorer_stays_below_thresholds() {
        let scanner = ContentSafetyScanner::new(Arc::new(RandomScorer), SafetyThresholds::default());
        for i in 0..50 {
            let scan = scanner.scan(&format!("img://{}", i)).await;
            assert!(scan.passed);
            assert!(scan.scores.max() < 0.2);
        }
    }
}
