//! Request and result types for image generation

use crate::error::{Result, ServiceError};
use crate::generation::provider::GenerationOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Free-form request parameters
///
/// A sorted map, so two parameter sets with the same keys and values serialize
/// identically regardless of insertion order.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Parameter holding the requested model category
pub const CATEGORY_PARAM: &str = "category";

/// Parameter holding the requested minimum quality
pub const QUALITY_PARAM: &str = "qualityRequirement";

/// Quality requirement assumed when a request does not name one
pub const DEFAULT_QUALITY_REQUIREMENT: f64 = 0.8;

/// Priority tier of a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Ordering weight, higher drains first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Normal => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A request to generate an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: String,
    /// Target model identifier
    pub model: String,
    pub prompt: String,
    pub parameters: Parameters,
    pub priority: Priority,
    pub user_id: String,
    pub submitted_at: DateTime<Utc>,
    pub estimated_cost: f64,
}

impl GenerationRequest {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("req-{}", Uuid::new_v4()),
            model: model.into(),
            prompt: prompt.into(),
            parameters: Parameters::new(),
            priority: Priority::Normal,
            user_id: user_id.into(),
            submitted_at: Utc::now(),
            estimated_cost: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }

    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Requested category name, if the parameters carry one
    pub fn category(&self) -> Option<&str> {
        self.parameters.get(CATEGORY_PARAM).and_then(|v| v.as_str())
    }

    /// Requested minimum quality, falling back to the default
    pub fn quality_requirement(&self) -> f64 {
        self.parameters
            .get(QUALITY_PARAM)
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_QUALITY_REQUIREMENT)
    }
}

/// Lifecycle status of a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStatus::Pending => write!(f, "pending"),
            GenerationStatus::Processing => write!(f, "processing"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a generation's outcome
///
/// Snapshots are never edited in place: each transition returns a new value
/// that replaces the previous one in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: String,
    pub request_id: String,
    pub status: GenerationStatus,
    pub model_id: Option<String>,
    pub image_ref: Option<String>,
    pub error: Option<String>,
    pub processing_time_ms: u64,
    pub actual_cost: f64,
    /// In [0, 1]
    pub quality_score: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl GenerationResult {
    /// Result for a request that has just been dispatched
    pub fn begin(request: &GenerationRequest) -> Self {
        Self {
            id: format!("gen-{}", Uuid::new_v4()),
            request_id: request.id.clone(),
            status: GenerationStatus::Processing,
            model_id: None,
            image_ref: None,
            error: None,
            processing_time_ms: 0,
            actual_cost: 0.0,
            quality_score: 0.0,
            metadata: BTreeMap::new(),
        }
    }

    /// Record the backend chosen for this generation
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Transition to `completed`
    pub fn complete(&self, output: GenerationOutput, elapsed: Duration) -> Result<Self> {
        self.ensure_open(GenerationStatus::Completed)?;

        let mut metadata = self.metadata.clone();
        metadata.extend(output.metadata);

        Ok(Self {
            status: GenerationStatus::Completed,
            image_ref: Some(output.image_ref),
            error: None,
            processing_time_ms: elapsed.as_millis() as u64,
            actual_cost: output.cost,
            quality_score: output.quality_score.clamp(0.0, 1.0),
            metadata,
            ..self.clone()
        })
    }

    /// Transition to `failed`
    pub fn fail(&self, error: impl Into<String>, elapsed: Duration) -> Result<Self> {
        self.ensure_open(GenerationStatus::Failed)?;

        Ok(Self {
            status: GenerationStatus::Failed,
            error: Some(error.into()),
            processing_time_ms: elapsed.as_millis() as u64,
            ..self.clone()
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == GenerationStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == GenerationStatus::Failed
    }

    fn ensure_open(&self, to: GenerationStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(ServiceError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}
