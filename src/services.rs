//! Wiring of one cache, one scheduler and one compliance log

use crate::cache::CacheStore;
use crate::clock::{SharedClock, SystemClock};
use crate::compliance::{ComplianceLog, ContentScorer, RandomScorer};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::generation::{GenerationProvider, ModelCatalog, ModelSelector, RequestScheduler, SimulatedProvider};
use crate::notify::{SharedNotifier, TracingNotifier};
use crate::ticker::RecurringTask;
use std::sync::Arc;
use tracing::info;

/// Shared service instances for one process
pub struct ServiceHub {
    pub cache: Arc<CacheStore>,
    pub scheduler: Arc<RequestScheduler>,
    pub compliance: Arc<ComplianceLog>,
}

/// Collaborators injected into a [`ServiceHub`]
pub struct ServiceParts {
    pub catalog: Arc<ModelCatalog>,
    pub provider: Arc<dyn GenerationProvider>,
    pub scorer: Arc<dyn ContentScorer>,
    pub notifier: SharedNotifier,
    pub clock: SharedClock,
}

impl Default for ServiceParts {
    fn default() -> Self {
        Self {
            catalog: Arc::new(ModelCatalog::builtin()),
            provider: Arc::new(SimulatedProvider::new()),
            scorer: Arc::new(RandomScorer),
            notifier: Arc::new(TracingNotifier),
            clock: SystemClock::shared(),
        }
    }
}

impl ServiceHub {
    /// Build the services with the built-in catalog and simulated backends
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_parts(config, ServiceParts::default())
    }

    pub fn with_parts(config: ServiceConfig, parts: ServiceParts) -> Result<Self> {
        config.validate()?;
        if parts.catalog.is_empty() {
            return Err(ServiceError::ConfigError("model catalog is empty".to_string()));
        }

        let ServiceConfig {
            cache,
            scheduler,
            compliance,
        } = config;

        let cache = Arc::new(CacheStore::with_clock(cache, parts.clock.clone()));
        let scheduler = Arc::new(
            RequestScheduler::new(
                scheduler,
                Arc::clone(&cache),
                ModelSelector::new(parts.catalog),
                parts.provider,
            )
            .with_notifier(parts.notifier)
            .with_clock(parts.clock.clone()),
        );
        let compliance = Arc::new(ComplianceLog::with_parts(compliance, parts.scorer, parts.clock));

        info!("Service hub ready");
        Ok(Self {
            cache,
            scheduler,
            compliance,
        })
    }

    /// Start the queue drain and whichever sweeps are enabled
    ///
    /// Background work stops when the returned handles are dropped.
    pub fn start(&self) -> Vec<RecurringTask> {
        let mut tasks = vec![self.scheduler.start()];
        tasks.extend(self.cache.start_auto_cleanup());
        tasks.extend(self.compliance.start_retention_sweep());
        tasks
    }
}
