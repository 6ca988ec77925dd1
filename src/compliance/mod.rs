//! # Compliance
//!
//! Audit trail, content safety scanning and data-subject requests.
//!
//! - [`ComplianceLog::record`] appends an audit entry and prunes entries past
//!   the retention window (90 days by default)
//! - [`ComplianceLog::scan`] scores an image through a [`ContentScorer`] and
//!   keeps the result in a scan history that retention does not touch
//! - [`ComplianceLog::handle_subject_request`] answers access, deletion and
//!   portability requests; deletion is idempotent
//! - [`ComplianceLog::compliance_report`] summarizes a trailing window
//!
//! All state lives in memory for the lifetime of the process.

pub mod audit;
pub mod config;
pub mod log;
pub mod report;
pub mod scanner;
pub mod subject;

pub use audit::{AuditEvent, AuditLogEntry, ComplianceFlags, NetworkOrigin};
pub use config::{ComplianceConfig, SafetyThresholds};
pub use log::ComplianceLog;
pub use report::{ActivityCount, ComplianceReport, ReportDetails, ReportSummary, SafetyMetrics};
pub use scanner::{
    ContentSafetyScanner, ContentScorer, RandomScorer, RiskScores, SecurityScan, StaticScorer,
};
pub use subject::{SubjectRequestKind, SubjectRequestRecord, SubjectResponse};
