//! Integration tests for the compliance log

use futures::future::join_all;
use imagegen_core::clock::ManualClock;
use imagegen_core::compliance::{
    AuditEvent, ComplianceConfig, ComplianceLog, RiskScores, StaticScorer, SubjectRequestKind,
    SubjectResponse,
};
use std::sync::Arc;
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn log_with_scores(scores: RiskScores) -> (Arc<ComplianceLog>, Arc<ManualClock>) {
    let clock = ManualClock::starting_now();
    let log = ComplianceLog::with_parts(
        ComplianceConfig::default(),
        Arc::new(StaticScorer(scores)),
        clock.clone(),
    );
    (Arc::new(log), clock)
}

fn log() -> (Arc<ComplianceLog>, Arc<ManualClock>) {
    log_with_scores(RiskScores::default())
}

#[tokio::test]
async fn test_entry_older_than_retention_is_pruned_on_record() {
    let (log, clock) = log();

    log.record(AuditEvent::new("user-1", "generate", "req-old")).await;
    clock.advance(DAY * 91);
    log.record(AuditEvent::new("user-2", "generate", "req-new")).await;

    assert_eq!(log.audit_len().await, 1);
    assert!(log.entries_for_user("user-1").await.is_empty());
}

#[tokio::test]
async fn test_entry_within_retention_survives() {
    let (log, clock) = log();

    log.record(AuditEvent::new("user-1", "generate", "req-1")).await;
    clock.advance(DAY * 89);
    log.record(AuditEvent::new("user-1", "generate", "req-2")).await;

    assert_eq!(log.entries_for_user("user-1").await.len(), 2);
}

#[tokio::test]
async fn test_erasure_then_access_returns_nothing() {
    let (log, _clock) = log();

    for i in 0..5 {
        log.record(AuditEvent::new("alice", "generate", format!("req-{}", i)))
            .await;
    }
    log.record(AuditEvent::new("bob", "generate", "req-b")).await;

    let erased = log
        .handle_subject_request("alice", SubjectRequestKind::Delete)
        .await;
    assert!(matches!(erased, SubjectResponse::Deleted { removed: 5, .. }));

    let access = log
        .handle_subject_request("alice", SubjectRequestKind::Access)
        .await;
    match access {
        SubjectResponse::Access {
            personal_data,
            processing_activities,
            ..
        } => {
            assert!(personal_data.is_empty());
            assert!(processing_activities.is_empty());
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // Repeating the deletion is not an error
    let again = log
        .handle_subject_request("alice", SubjectRequestKind::Delete)
        .await;
    assert!(matches!(
        again,
        SubjectResponse::Deleted { removed: 0, already_deleted: true, .. }
    ));
}

#[tokio::test]
async fn test_scan_thresholds() {
    let (flagging, _clock) = log_with_scores(RiskScores {
        nsfw: 0.35,
        ..Default::default()
    });
    let scan = flagging.scan("img://flagged").await;
    assert!(!scan.passed);
    assert!(scan
        .flagged_reasons
        .iter()
        .any(|reason| reason.contains("NSFW")));

    let (clean, _clock) = log();
    let scan = clean.scan("img://clean").await;
    assert!(scan.passed);
    assert!(scan.flagged_reasons.is_empty());
}

#[tokio::test]
async fn test_report_counts_window() {
    let (log, clock) = log_with_scores(RiskScores {
        copyright: 0.6,
        ..Default::default()
    });

    log.record(AuditEvent::new("u", "generate", "r1")).await;
    log.handle_subject_request("u", SubjectRequestKind::Portability)
        .await;
    clock.advance(DAY * 31);

    log.record(AuditEvent::new("u", "download", "r1")).await;
    log.scan("img://1").await;

    let report = log.compliance_report().await;
    assert_eq!(report.summary.total_activities, 1);
    assert_eq!(report.summary.content_scans, 1);
    assert_eq!(report.summary.safety_violations, 1);
    assert_eq!(report.summary.subject_requests, 0);
    assert!(report
        .details
        .compliance_gaps
        .iter()
        .any(|gap| gap.contains("safety")));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["total_activities"], 1);
}

#[tokio::test]
async fn test_concurrent_records() {
    let (log, _clock) = log();

    let writes = (0..50).map(|i| {
        let log = Arc::clone(&log);
        async move {
            log.record(AuditEvent::new(format!("user-{}", i % 5), "generate", format!("req-{}", i)))
                .await
        }
    });
    let entries = join_all(writes).await;

    let mut ids: Vec<String> = entries.into_iter().map(|e| e.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
    assert_eq!(log.entries_for_user("user-3").await.len(), 10);
}

#[tokio::test]
async fn test_retention_sweep_runs_in_background() {
    let config = ComplianceConfig {
        retention_sweep_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let clock = ManualClock::starting_now();
    let log = Arc::new(ComplianceLog::with_parts(
        config,
        Arc::new(StaticScorer::default()),
        clock.clone(),
    ));

    log.record(AuditEvent::new("u", "generate", "r")).await;
    let task = log.start_retention_sweep().expect("automatic deletion enabled");

    clock.advance(DAY * 100);
    tokio::time::sleep(Duration::from_millis(60)).await;
    task.cancel();

    assert_eq!(log.audit_len().await, 0);
}
