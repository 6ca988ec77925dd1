//! Boundary to the external image-generation provider

use crate::error::{Result, ServiceError};
use crate::generation::catalog::ModelDescriptor;
use crate::generation::types::GenerationRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// One dispatched request together with the backend chosen for it
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub request: GenerationRequest,
    pub model: ModelDescriptor,
}

/// What the provider returns for a successful generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub image_ref: String,
    pub cost: f64,
    pub quality_score: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// An image-generation backend
///
/// Implementations are expected to fail with [`ServiceError::UpstreamFailure`]
/// when the provider rejects or cannot complete the job.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, job: &GenerationJob) -> Result<GenerationOutput>;
}

/// In-process stand-in for a hosted provider
///
/// Waits for the model's average processing time (scaled), fails with the
/// configured probability, and reports the model's price as the cost.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    latency_scale: f64,
    failure_rate: f64,
    image_base_url: String,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self {
            latency_scale: 1.0,
            failure_rate: 0.0,
            image_base_url: "https://images.example.com/generated".to_string(),
        }
    }
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiply simulated processing time by `scale` (0 for no wait)
    pub fn with_latency_scale(mut self, scale: f64) -> Self {
        self.latency_scale = scale.max(0.0);
        self
    }

    /// Probability in [0, 1] that a generation fails
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into();
        self
    }

    fn simulated_latency(&self, model: &ModelDescriptor) -> Duration {
        Duration::from_secs_f64(
            model.performance.avg_processing_time_ms as f64 / 1000.0 * self.latency_scale,
        )
    }
}

#[async_trait]
impl GenerationProvider for SimulatedProvider {
    async fn generate(&self, job: &GenerationJob) -> Result<GenerationOutput> {
        let latency = self.simulated_latency(&job.model);
        let fails = rand::random::<f64>() < self.failure_rate;
        let jitter = rand::random::<f64>() * 0.1 - 0.05;

        debug!(
            "Simulating generation of {} on {} ({:?})",
            job.request.id, job.model.id, latency
        );
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fails {
            return Err(ServiceError::UpstreamFailure(format!(
                "provider rejected prediction for model {}",
                job.model.id
            )));
        }

        let prediction_id = Uuid::new_v4();
        Ok(GenerationOutput {
            image_ref: format!("{}/{}.png", self.image_base_url, prediction_id),
            cost: job.model.price,
            quality_score: (job.model.performance.quality + jitter).clamp(0.0, 1.0),
            metadata: BTreeMap::from([
                ("prediction_id".to_string(), json!(prediction_id.to_string())),
                ("model".to_string(), json!(job.model.id)),
            ]),
        })
    }
}
