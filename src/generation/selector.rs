//! Backend selection from the catalog

use crate::error::{Result, ServiceError};
use crate::generation::catalog::{ModelCatalog, ModelCategory, ModelDescriptor};
use crate::generation::types::Priority;
use std::sync::Arc;
use tracing::debug;

/// Quality requirement above which high-priority requests get the best model
pub const HIGH_QUALITY_THRESHOLD: f64 = 0.9;

/// Picks a backend for a request
///
/// - high priority with a quality requirement above the threshold: highest quality
/// - low priority: lowest price
/// - otherwise: best `(quality + reliability) / price`
///
/// Ties go to the model listed first in the catalog. A category with no models
/// is an error; the caller decides on a fallback.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    catalog: Arc<ModelCatalog>,
    high_quality_threshold: f64,
}

impl ModelSelector {
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self {
            catalog,
            high_quality_threshold: HIGH_QUALITY_THRESHOLD,
        }
    }

    pub fn with_high_quality_threshold(mut self, threshold: f64) -> Self {
        self.high_quality_threshold = threshold;
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn select(
        &self,
        category: ModelCategory,
        priority: Priority,
        quality_requirement: f64,
    ) -> Result<&ModelDescriptor> {
        let candidates = self.catalog.by_category(category);

        let chosen = if priority == Priority::High && quality_requirement > self.high_quality_threshold {
            first_best(candidates, |m| m.performance.quality)
        } else if priority == Priority::Low {
            first_best(candidates, |m| -m.price)
        } else {
            first_best(candidates, ModelDescriptor::efficiency)
        };

        let model = chosen.ok_or_else(|| ServiceError::NoModelForCategory {
            category: category.to_string(),
        })?;

        debug!(
            "Selected model {} for category={} priority={} quality>={}",
            model.id, category, priority, quality_requirement
        );
        Ok(model)
    }
}

/// Highest-scoring candidate, keeping the earliest on ties
fn first_best<'a, F>(candidates: Vec<&'a ModelDescriptor>, score: F) -> Option<&'a ModelDescriptor>
where
    F: Fn(&ModelDescriptor) -> f64,
{
    candidates
        .into_iter()
        .reduce(|best, current| if score(current) > score(best) { current } else { best })
}
