//! Top-level configuration for all services

use crate::cache::CacheConfig;
use crate::compliance::ComplianceConfig;
use crate::error::{Result, ServiceError};
use crate::generation::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "IMAGEGEN_";

/// Configuration of the cache, scheduler and compliance log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub scheduler: SchedulerConfig,
    pub compliance: ComplianceConfig,
}

impl ServiceConfig {
    /// Defaults overridden from the environment (and a `.env` file, if present)
    ///
    /// Recognized variables, all prefixed with `IMAGEGEN_`:
    /// `CACHE_MAX_BYTES`, `CACHE_TTL_SECS`, `DRAIN_INTERVAL_MS`,
    /// `MIN_DISPATCH_INTERVAL_MS`, `GENERATION_TIMEOUT_MS`, `RETENTION_DAYS`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(bytes) = parse::<usize>(&var, "CACHE_MAX_BYTES")? {
            config.cache.max_size_bytes = bytes;
        }
        if let Some(secs) = parse::<u64>(&var, "CACHE_TTL_SECS")? {
            config.cache.default_ttl = Duration::from_secs(secs);
        }
        if let Some(ms) = parse::<u64>(&var, "DRAIN_INTERVAL_MS")? {
            config.scheduler.drain_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&var, "MIN_DISPATCH_INTERVAL_MS")? {
            config.scheduler.min_dispatch_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&var, "GENERATION_TIMEOUT_MS")? {
            config.scheduler.generation_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(days) = parse::<u32>(&var, "RETENTION_DAYS")? {
            config.compliance.retention_days = days;
        }

        config.validate()?;
        debug!("Loaded service configuration: {:?}", config);
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.cache
            .validate()
            .map_err(|e| ServiceError::ConfigError(format!("cache: {}", e)))?;
        self.scheduler
            .validate()
            .map_err(|e| ServiceError::ConfigError(format!("scheduler: {}", e)))?;
        self.compliance
            .validate()
            .map_err(|e| ServiceError::ConfigError(format!("compliance: {}", e)))?;
        Ok(())
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(suffix) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            ServiceError::ConfigError(format!("{}{}={:?}: {}", ENV_PREFIX, suffix, raw, e))
        }),
    }
}
