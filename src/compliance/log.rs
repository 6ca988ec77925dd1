//! Append-only audit trail with retention pruning and subject requests

use crate::clock::{SharedClock, SystemClock};
use crate::compliance::audit::{AuditEvent, AuditLogEntry};
use crate::compliance::config::ComplianceConfig;
use crate::compliance::report::{
    compliance_gaps, most_common_activities, recommendations, ComplianceReport, ReportDetails,
    ReportSummary, SafetyMetrics, TOP_ACTIVITIES,
};
use crate::compliance::scanner::{ContentSafetyScanner, ContentScorer, RandomScorer, SecurityScan};
use crate::compliance::subject::{
    distinct_actions, SubjectRequestKind, SubjectRequestRecord, SubjectResponse, EXPORT_FORMAT,
};
use crate::ticker::RecurringTask;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct ComplianceState {
    /// Chronological
    audit: Vec<AuditLogEntry>,
    /// Not subject to audit retention
    scans: Vec<SecurityScan>,
    subject_requests: Vec<SubjectRequestRecord>,
}

/// Audit log, scan history and subject-request handling
///
/// Every mutation goes through the methods below; callers only ever see clones.
pub struct ComplianceLog {
    config: ComplianceConfig,
    scanner: ContentSafetyScanner,
    clock: SharedClock,
    state: RwLock<ComplianceState>,
}

impl ComplianceLog {
    /// Create a log with the random stand-in scorer on the system clock
    pub fn new(config: ComplianceConfig) -> Self {
        Self::with_parts(config, Arc::new(RandomScorer), SystemClock::shared())
    }

    pub fn with_parts(
        config: ComplianceConfig,
        scorer: Arc<dyn ContentScorer>,
        clock: SharedClock,
    ) -> Self {
        info!("Initializing compliance log with config: {:?}", config);

        let scanner =
            ContentSafetyScanner::new(scorer, config.thresholds.clone()).with_clock(clock.clone());

        Self {
            config,
            scanner,
            clock,
            state: RwLock::new(ComplianceState::default()),
        }
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn scanner(&self) -> &ContentSafetyScanner {
        &self.scanner
    }

    /// Append an audit entry, then prune by retention if enabled
    pub async fn record(&self, event: AuditEvent) -> AuditLogEntry {
        let now = self.clock.now();
        let entry = AuditLogEntry::from_event(event, format!("audit-{}", Uuid::new_v4()), now);

        let mut state = self.state.write().await;
        state.audit.push(entry.clone());
        debug!(
            "Recorded audit entry {} ({} by {})",
            entry.id, entry.action, entry.user_id
        );

        if self.config.automatic_deletion {
            self.prune(&mut state, now);
        }

        entry
    }

    /// Scan an image and keep the result in the scan history
    pub async fn scan(&self, image_ref: &str) -> SecurityScan {
        let scan = self.scanner.scan(image_ref).await;
        self.state.write().await.scans.push(scan.clone());
        scan
    }

    /// Answer an access, deletion or portability request
    ///
    /// Deletion is idempotent: a second deletion removes nothing and reports
    /// `already_deleted`.
    pub async fn handle_subject_request(
        &self,
        user_id: &str,
        kind: SubjectRequestKind,
    ) -> SubjectResponse {
        let now = self.clock.now();
        let mut state = self.state.write().await;

        state.subject_requests.push(SubjectRequestRecord {
            user_id: user_id.to_string(),
            kind,
            timestamp: now,
        });
        info!("Handling {} request for user {}", kind, user_id);

        match kind {
            SubjectRequestKind::Access => {
                let personal_data = entries_for(&state.audit, user_id);
                SubjectResponse::Access {
                    processing_activities: distinct_actions(&personal_data),
                    personal_data,
                    retention_days: self.config.retention_days,
                    legal_basis: self.config.legal_basis.clone(),
                }
            }
            SubjectRequestKind::Delete => {
                let before = state.audit.len();
                state.audit.retain(|entry| entry.user_id != user_id);
                let removed = before - state.audit.len();

                info!("Erased {} audit entries for user {}", removed, user_id);
                SubjectResponse::Deleted {
                    removed,
                    already_deleted: removed == 0,
                    confirmed_at: now,
                }
            }
            SubjectRequestKind::Portability => SubjectResponse::Portability {
                format: EXPORT_FORMAT.to_string(),
                data: entries_for(&state.audit, user_id),
                exported_at: now,
            },
        }
    }

    /// Report over the configured window
    pub async fn compliance_report(&self) -> ComplianceReport {
        self.compliance_report_for(self.config.report_window_days)
            .await
    }

    /// Report over the trailing `window_days`
    pub async fn compliance_report_for(&self, window_days: u32) -> ComplianceReport {
        let now = self.clock.now();
        let since = cutoff(now, days(window_days));
        let retention_cutoff = cutoff(now, self.config.retention());
        let state = self.state.read().await;

        let recent_audit: Vec<&AuditLogEntry> =
            state.audit.iter().filter(|e| e.timestamp > since).collect();
        let recent_scans: Vec<&SecurityScan> =
            state.scans.iter().filter(|s| s.timestamp > since).collect();

        let retained = state
            .audit
            .iter()
            .filter(|e| e.timestamp > retention_cutoff)
            .count();
        let retention_compliance = if state.audit.is_empty() {
            100.0
        } else {
            retained as f64 / state.audit.len() as f64 * 100.0
        };

        ComplianceReport {
            generated_at: now,
            window_days,
            summary: ReportSummary {
                total_activities: recent_audit.len(),
                content_scans: recent_scans.len(),
                safety_violations: recent_scans.iter().filter(|s| !s.passed).count(),
                subject_requests: state
                    .subject_requests
                    .iter()
                    .filter(|r| r.timestamp > since)
                    .count(),
                retention_compliance,
            },
            details: ReportDetails {
                most_common_activities: most_common_activities(&recent_audit, TOP_ACTIVITIES),
                safety_metrics: SafetyMetrics::from_scans(&recent_scans),
                compliance_gaps: compliance_gaps(&state.audit, &state.scans),
            },
            recommendations: recommendations(),
        }
    }

    /// Drop audit entries and subject-request records older than the retention window
    ///
    /// Returns the number of audit entries removed. Runs regardless of
    /// `automatic_deletion`.
    pub async fn apply_retention(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        self.prune(&mut state, now)
    }

    /// Start the background retention sweep, if automatic deletion is enabled
    pub fn start_retention_sweep(self: &Arc<Self>) -> Option<RecurringTask> {
        if !self.config.automatic_deletion {
            return None;
        }

        let log = Arc::clone(self);
        Some(RecurringTask::spawn(
            "retention-sweep",
            self.config.retention_sweep_interval,
            move || {
                let log = Arc::clone(&log);
                async move {
                    log.apply_retention().await;
                }
            },
        ))
    }

    /// Audit entries of one user, oldest first
    pub async fn entries_for_user(&self, user_id: &str) -> Vec<AuditLogEntry> {
        entries_for(&self.state.read().await.audit, user_id)
    }

    pub async fn audit_len(&self) -> usize {
        self.state.read().await.audit.len()
    }

    pub async fn scan_history(&self) -> Vec<SecurityScan> {
        self.state.read().await.scans.clone()
    }

    pub async fn subject_requests(&self) -> Vec<SubjectRequestRecord> {
        self.state.read().await.subject_requests.clone()
    }

    fn prune(&self, state: &mut ComplianceState, now: DateTime<Utc>) -> usize {
        let oldest_kept = cutoff(now, self.config.retention());

        let before = state.audit.len();
        state.audit.retain(|entry| entry.timestamp > oldest_kept);
        state
            .subject_requests
            .retain(|record| record.timestamp > oldest_kept);
        let removed = before - state.audit.len();

        if removed > 0 {
            info!(
                "Retention removed {} audit entries older than {} days",
                removed, self.config.retention_days
            );
        }
        removed
    }
}

fn entries_for(audit: &[AuditLogEntry], user_id: &str) -> Vec<AuditLogEntry> {
    audit
        .iter()
        .filter(|entry| entry.user_id == user_id)
        .cloned()
        .collect()
}

fn days(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * 24 * 3600)
}

/// `now - window`, clamped at the earliest representable instant
fn cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::compliance::audit::ComplianceFlags;
    use crate::compliance::scanner::{RiskScores, StaticScorer, NSFW_REASON};
    use crate::compliance::report::{GDPR_GAP, SAFETY_GAP};

    fn log_with(config: ComplianceConfig, scores: RiskScores) -> (ComplianceLog, Arc<ManualClock>) {
        let clock = ManualClock::starting_now();
        let log = ComplianceLog::with_parts(config, Arc::new(StaticScorer(scores)), clock.clone());
        (log, clock)
    }

    fn log() -> (ComplianceLog, Arc<ManualClock>) {
        log_with(ComplianceConfig::default(), RiskScores::default())
    }

    #[tokio::test]
    async fn test_record_assigns_id_and_timestamp() {
        let (log, clock) = log();

        let entry = log.record(AuditEvent::new("user-1", "generate", "req-1")).await;

        assert!(entry.id.starts_with("audit-"));
        assert_eq!(entry.timestamp, clock.now());
        assert_eq!(log.audit_len().await, 1);
    }

    #[tokio::test]
    async fn test_record_prunes_old_entries() {
        let (log, clock) = log();

        log.record(AuditEvent::new("user-1", "generate", "old")).await;
        clock.advance(days(91));
        log.record(AuditEvent::new("user-1", "generate", "new")).await;

        let entries = log.entries_for_user("user-1").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource_id, "new");
    }

    #[tokio::test]
    async fn test_retention_disabled_keeps_entries() {
        let config = ComplianceConfig {
            automatic_deletion: false,
            ..Default::default()
        };
        let (log, clock) = log_with(config, RiskScores::default());

        log.record(AuditEvent::new("u", "generate", "old")).await;
        clock.advance(days(120));
        log.record(AuditEvent::new("u", "generate", "new")).await;
        assert_eq!(log.audit_len().await, 2);

        let report = log.compliance_report().await;
        assert_eq!(report.summary.retention_compliance, 50.0);

        assert_eq!(log.apply_retention().await, 1);
        assert_eq!(log.audit_len().await, 1);
        assert!(Arc::new(log).start_retention_sweep().is_none());
    }

    #[tokio::test]
    async fn test_subject_access_and_portability() {
        let (log, _clock) = log();
        log.record(AuditEvent::new("alice", "generate", "r1")).await;
        log.record(AuditEvent::new("bob", "generate", "r2")).await;
        log.record(AuditEvent::new("alice", "download", "r1")).await;
        log.record(AuditEvent::new("alice", "generate", "r3")).await;

        match log.handle_subject_request("alice", SubjectRequestKind::Access).await {
            SubjectResponse::Access {
                personal_data,
                processing_activities,
                retention_days,
                legal_basis,
            } => {
                assert_eq!(personal_data.len(), 3);
                assert_eq!(processing_activities, vec!["generate", "download"]);
                assert_eq!(retention_days, 90);
                assert_eq!(legal_basis, "legitimate_interest");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let export = log
            .handle_subject_request("alice", SubjectRequestKind::Portability)
            .await;
        assert!(matches!(&export, SubjectResponse::Portability { format, .. } if format == "json"));
        assert_eq!(export.entries().len(), 3);
    }

    #[tokio::test]
    async fn test_subject_erasure_is_idempotent() {
        let (log, _clock) = log();
        log.record(AuditEvent::new("alice", "generate", "r1")).await;
        log.record(AuditEvent::new("alice", "download", "r1")).await;
        log.record(AuditEvent::new("bob", "generate", "r2")).await;

        let first = log.handle_subject_request("alice", SubjectRequestKind::Delete).await;
        assert!(matches!(
            first,
            SubjectResponse::Deleted { removed: 2, already_deleted: false, .. }
        ));

        let second = log.handle_subject_request("alice", SubjectRequestKind::Delete).await;
        assert!(matches!(
            second,
            SubjectResponse::Deleted { removed: 0, already_deleted: true, .. }
        ));

        let access = log.handle_subject_request("alice", SubjectRequestKind::Access).await;
        assert!(access.entries().is_empty());
        assert_eq!(log.entries_for_user("bob").await.len(), 1);

        // The requests themselves are still accounted for
        assert_eq!(log.subject_requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_scan_history_is_kept() {
        let (log, clock) = log_with(
            ComplianceConfig::default(),
            RiskScores {
                nsfw: 0.35,
                ..Default::default()
            },
        );

        let scan = log.scan("img://1").await;
        assert!(!scan.passed);
        assert_eq!(scan.flagged_reasons, vec![NSFW_REASON]);

        // Audit retention does not touch scans
        clock.advance(days(200));
        log.apply_retention().await;
        assert_eq!(log.scan_history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_compliance_report() {
        let (log, clock) = log_with(
            ComplianceConfig::default(),
            RiskScores {
                violence: 0.5,
                ..Default::default()
            },
        );

        log.record(AuditEvent::new("u", "old_action", "r")).await;
        log.scan("img://old").await;
        clock.advance(days(40));

        log.record(AuditEvent::new("u", "generate", "r1")).await;
        log.record(AuditEvent::new("u", "generate", "r2")).await;
        log.record(
            AuditEvent::new("v", "login", "s1").with_flags(ComplianceFlags {
                gdpr_compliant: false,
                ..Default::default()
            }),
        )
        .await;
        log.scan("img://new").await;
        log.handle_subject_request("u", SubjectRequestKind::Access).await;

        let report = log.compliance_report().await;

        assert_eq!(report.window_days, 30);
        assert_eq!(report.summary.total_activities, 3);
        assert_eq!(report.summary.content_scans, 1);
        assert_eq!(report.summary.safety_violations, 1);
        assert_eq!(report.summary.subject_requests, 1);
        assert_eq!(report.summary.retention_compliance, 100.0);
        assert_eq!(report.details.most_common_activities[0].action, "generate");
        assert_eq!(report.details.most_common_activities[0].count, 2);
        assert_eq!(report.details.safety_metrics.safety_rate, 0.0);
        assert_eq!(report.details.compliance_gaps, vec![GDPR_GAP, SAFETY_GAP]);
        assert_eq!(report.recommendations.len(), 5);

        let wide = log.compliance_report_for(60).await;
        assert_eq!(wide.summary.total_activities, 4);
        assert_eq!(wide.summary.content_scans, 2);
    }

    #[tokio::test]
    async fn test_empty_report() {
        let (log, _clock) = log();
        let report = log.compliance_report().await;

        assert_eq!(report.summary.total_activities, 0);
        assert_eq!(report.summary.retention_compliance, 100.0);
        assert_eq!(report.details.safety_metrics.safety_rate, 100.0);
        assert!(report.details.most_common_activities.is_empty());
        assert!(report.details.compliance_gaps.is_empty());
    }
}
