//! Error types for the generation services
//!
//! Lookups that find nothing are reported as `None` or empty collections, never
//! as errors. The variants here cover configuration problems, failed upstream
//! generation calls and invalid state transitions.

use thiserror::Error;

/// Main error type for the generation services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The external generation call failed
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    /// The external generation call did not finish in time
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    Timeout { timeout_ms: u64, context: String },

    /// The catalog holds no model for the requested category
    #[error("No model available for category '{category}'")]
    NoModelForCategory { category: String },

    /// The category name is not one the catalog knows about
    #[error("Unknown model category: {0}")]
    UnknownCategory(String),

    /// A generation result was asked to move out of a terminal state
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Whether the error should be shown to the end user
    ///
    /// Only failures of the external generation call are user-visible.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            ServiceError::UpstreamFailure(_) | ServiceError::Timeout { .. }
        )
    }
}

impl From<String> for ServiceError {
    fn from(s: String) -> Self {
        ServiceError::Other(s)
    }
}

impl From<&str> for ServiceError {
    fn from(s: &str) -> Self {
        ServiceError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}
