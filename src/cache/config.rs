//! Configuration for the result cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the result cache
///
/// - Default TTL: 24 hours, long enough to reuse a generation across a session
/// - Byte budget: bounds memory no matter how many results are cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live applied when `set` is called without one
    pub default_ttl: Duration,

    /// Maximum total estimated size of cached results in bytes
    pub max_size_bytes: usize,

    /// Run a background sweep for expired entries
    pub enable_auto_cleanup: bool,

    /// Interval between background sweeps
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(24 * 3600),
            // 100 MiB
            max_size_bytes: 100 * 1024 * 1024,
            enable_auto_cleanup: true,
            // Sweep every 5 minutes
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Start from the defaults and override selected fields
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size_bytes == 0 {
            return Err("max_size_bytes must be greater than 0".to_string());
        }

        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err("cleanup_interval must be greater than 0 when auto cleanup is enabled".to_string());
        }

        Ok(())
    }

    /// Configuration for memory-constrained clients
    pub fn small() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_size_bytes: 10 * 1024 * 1024,
            ..Default::default()
        }
    }

    /// Configuration for long sessions with many repeated prompts
    pub fn large() -> Self {
        Self {
            default_ttl: Duration::from_secs(48 * 3600),
            max_size_bytes: 1024 * 1024 * 1024,
            cleanup_interval: Duration::from_secs(900),
            ..Default::default()
        }
    }
}

/// Builder for cache configuration, starting from the defaults
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// TTL applied when `set` is called without one
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Byte budget for all entries together
    pub fn max_size_bytes(mut self, size: usize) -> Self {
        self.config.max_size_bytes = size;
        self
    }

    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.config.enable_auto_cleanup = enable;
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
