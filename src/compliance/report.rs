//! Compliance report over a trailing window

use crate::compliance::audit::AuditLogEntry;
use crate::compliance::scanner::SecurityScan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of entries in `most_common_activities`
pub const TOP_ACTIVITIES: usize = 5;

pub const GDPR_GAP: &str = "GDPR compliance gaps detected in some activities";
pub const SAFETY_GAP: &str = "Content safety violations need attention";

/// Standing remediation advice attached to every report
pub const RECOMMENDATIONS: [&str; 5] = [
    "Implement automated GDPR consent collection",
    "Enhance content filtering algorithms",
    "Regular security compliance audits",
    "Update data retention policies",
    "Staff training on data protection",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub generated_at: DateTime<Utc>,
    pub window_days: u32,
    pub summary: ReportSummary,
    pub details: ReportDetails,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Audit entries inside the window
    pub total_activities: usize,
    /// Scans inside the window
    pub content_scans: usize,
    /// Failed scans inside the window
    pub safety_violations: usize,
    /// Subject requests handled inside the window
    pub subject_requests: usize,
    /// Percentage of audit entries within the retention period
    pub retention_compliance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub most_common_activities: Vec<ActivityCount>,
    pub safety_metrics: SafetyMetrics,
    /// Gaps across the whole log, not only the window
    pub compliance_gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCount {
    pub action: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMetrics {
    /// Percentage of passed scans, 100 when there are none
    pub safety_rate: f64,
    /// Mean of each scan's highest score, as a percentage
    pub average_risk_score: f64,
}

impl SafetyMetrics {
    pub fn from_scans(scans: &[&SecurityScan]) -> Self {
        if scans.is_empty() {
            return Self {
                safety_rate: 100.0,
                average_risk_score: 0.0,
            };
        }

        let total = scans.len() as f64;
        let passed = scans.iter().filter(|s| s.passed).count() as f64;
        let risk_sum: f64 = scans.iter().map(|s| s.scores.max()).sum();

        Self {
            safety_rate: passed / total * 100.0,
            average_risk_score: risk_sum / total * 100.0,
        }
    }
}

/// Most frequent actions, highest count first, ties by action name
pub fn most_common_activities(entries: &[&AuditLogEntry], limit: usize) -> Vec<ActivityCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.action.as_str()).or_insert(0) += 1;
    }

    let mut activities: Vec<ActivityCount> = counts
        .into_iter()
        .map(|(action, count)| ActivityCount {
            action: action.to_string(),
            count,
        })
        .collect();
    activities.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));
    activities.truncate(limit);
    activities
}

pub(crate) fn compliance_gaps(audit: &[AuditLogEntry], scans: &[SecurityScan]) -> Vec<String> {
    let mut gaps = Vec::new();

    if audit.iter().any(|entry| !entry.flags.gdpr_compliant) {
        gaps.push(GDPR_GAP.to_string());
    }

    if scans.iter().any(|scan| !scan.passed) {
        gaps.push(SAFETY_GAP.to_string());
    }

    gaps
}

pub(crate) fn recommendations() -> Vec<String> {
    RECOMMENDATIONS.iter().map(|r| r.to_string()).collect()
}
