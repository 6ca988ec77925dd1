//! # Generation Scheduling
//!
//! Request types, backend selection and the rate-limited request queue.
//!
//! - [`ModelCatalog`] lists the available backends and [`ModelSelector`] picks
//!   one per request from category, priority and quality requirement
//! - [`fingerprint`] derives the deduplication key of a request
//! - [`RequestScheduler`] queues requests by priority and dispatches them to a
//!   [`GenerationProvider`] one at a time, storing every result in the cache

pub mod catalog;
pub mod config;
pub mod fingerprint;
pub mod metrics;
pub mod provider;
pub mod scheduler;
pub mod selector;
pub mod types;

pub use catalog::{ModelCatalog, ModelCategory, ModelDescriptor, PerformanceProfile};
pub use config::{HintThresholds, SchedulerConfig};
pub use fingerprint::{fingerprint, FingerprintBuilder};
pub use metrics::PerformanceMetrics;
pub use provider::{GenerationJob, GenerationOutput, GenerationProvider, SimulatedProvider};
pub use scheduler::{DrainOutcome, RequestScheduler};
pub use selector::ModelSelector;
pub use types::{
    GenerationRequest, GenerationResult, GenerationStatus, Parameters, Priority,
};
