//! # imagegen-core
//!
//! In-process services behind an image-generation front end: a result cache,
//! a rate-limited request scheduler and a compliance log.
//!
//! ## Features
//!
//! - Result cache with per-entry TTL and LRU eviction under a byte budget
//! - Request deduplication by fingerprint of model, prompt and parameters
//! - Priority queue drained one request at a time under a minimum dispatch interval
//! - Backend selection by category, priority and quality requirement
//! - Audit trail with retention pruning, content safety scans and
//!   data-subject requests (access, deletion, portability)
//!
//! ## Generating an Image
//!
//! ```no_run
//! use imagegen_core::{GenerationRequest, Priority, ServiceConfig, ServiceHub};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let hub = ServiceHub::new(ServiceConfig::from_env()?)?;
//!     let _tasks = hub.start();
//!
//!     let request = GenerationRequest::new("stability-ai/sdxl", "a lighthouse at dusk", "user-1")
//!         .with_priority(Priority::High)
//!         .with_parameter("category", "photography");
//!     let id = hub.scheduler.submit(request).await;
//!
//!     if let Some(result) = hub.scheduler.status(&id).await {
//!         println!("{}: {}", id, result.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Compliance
//!
//! ```no_run
//! use imagegen_core::compliance::{AuditEvent, ComplianceConfig, ComplianceLog, SubjectRequestKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = ComplianceLog::new(ComplianceConfig::default());
//!
//!     log.record(AuditEvent::new("user-1", "image_generated", "req-1")).await;
//!
//!     let scan = log.scan("https://images.example.com/generated/1.png").await;
//!     if !scan.passed {
//!         println!("Flagged: {:?}", scan.flagged_reasons);
//!     }
//!
//!     log.handle_subject_request("user-1", SubjectRequestKind::Delete).await;
//!     println!("{:?}", log.compliance_report().await.summary);
//! }
//! ```
//!
//! All state is kept in memory; a restart clears the cache, queue and logs.
//!
//! A runnable walkthrough of the whole hub lives in `demos/service_demo.rs`
//! and is registered as the `service_demo` example.

pub mod cache;
pub mod clock;
pub mod compliance;
pub mod config;
pub mod error;
pub mod generation;
pub mod notify;
pub mod services;
pub mod ticker;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheStats, CacheStore, SizeEstimator};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use compliance::{ComplianceConfig, ComplianceLog, ContentSafetyScanner, SecurityScan};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use generation::{
    DrainOutcome, GenerationRequest, GenerationResult, GenerationStatus, ModelCatalog,
    ModelSelector, Priority, RequestScheduler, SchedulerConfig,
};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use services::{ServiceHub, ServiceParts};
pub use ticker::RecurringTask;
