//! Static catalog of generation backends

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of imagery a backend is tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Photography,
    Artistic,
    Commercial,
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelCategory::Photography => write!(f, "photography"),
            ModelCategory::Artistic => write!(f, "artistic"),
            ModelCategory::Commercial => write!(f, "commercial"),
        }
    }
}

impl FromStr for ModelCategory {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photography" => Ok(ModelCategory::Photography),
            "artistic" => Ok(ModelCategory::Artistic),
            "commercial" => Ok(ModelCategory::Commercial),
            other => Err(ServiceError::UnknownCategory(other.to_string())),
        }
    }
}

/// Observed performance of a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub avg_processing_time_ms: u64,
    /// In [0, 1]
    pub reliability: f64,
    /// In [0, 1]
    pub quality: f64,
}

/// A generation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ModelCategory,
    /// Price per generation
    pub price: f64,
    pub performance: PerformanceProfile,
    pub capabilities: Vec<String>,
}

impl ModelDescriptor {
    /// Quality plus reliability per unit of price; unbounded for free models
    pub fn efficiency(&self) -> f64 {
        let value = self.performance.quality + self.performance.reliability;
        if self.price <= 0.0 {
            f64::INFINITY
        } else {
            value / self.price
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Read-only list of available backends
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// The hosted backends offered out of the box
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelDescriptor {
                id: "stability-ai/sdxl".to_string(),
                name: "SDXL Turbo".to_string(),
                description: "High-quality, fast image generation".to_string(),
                category: ModelCategory::Photography,
                price: 0.01,
                performance: PerformanceProfile {
                    avg_processing_time_ms: 5_000,
                    reliability: 0.95,
                    quality: 0.9,
                },
                capabilities: vec![
                    "photorealistic".to_string(),
                    "portraits".to_string(),
                    "landscapes".to_string(),
                ],
            },
            ModelDescriptor {
                id: "bytedance/sdxl-lightning-4step".to_string(),
                name: "SDXL Lightning".to_string(),
                description: "Ultra-fast generation for rapid prototyping".to_string(),
                category: ModelCategory::Commercial,
                price: 0.005,
                performance: PerformanceProfile {
                    avg_processing_time_ms: 2_000,
                    reliability: 0.9,
                    quality: 0.8,
                },
                capabilities: vec![
                    "commercial".to_string(),
                    "product".to_string(),
                    "quick-iterations".to_string(),
                ],
            },
            ModelDescriptor {
                id: "playgroundai/playground-v2.5-1024px-aesthetic".to_string(),
                name: "Playground v2.5".to_string(),
                description: "Artistic and aesthetic image generation".to_string(),
                category: ModelCategory::Artistic,
                price: 0.015,
                performance: PerformanceProfile {
                    avg_processing_time_ms: 8_000,
                    reliability: 0.93,
                    quality: 0.95,
                },
                capabilities: vec![
                    "artistic".to_string(),
                    "aesthetic".to_string(),
                    "creative".to_string(),
                ],
            },
        ])
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Models in `category`, in catalog order
    pub fn by_category(&self, category: ModelCategory) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.category == category).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
