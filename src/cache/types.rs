//! Core type definitions for the cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type: a request fingerprint
pub type CacheKey = String;

/// Point-in-time statistics for the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Number of entries currently stored, including ones already past expiry
    pub entries: usize,

    /// Total estimated size of stored entries in bytes
    pub size_bytes: usize,

    /// Configured byte budget
    pub max_size_bytes: usize,

    /// Percentage of the budget in use
    pub size_utilization: f64,

    /// Mean access count across entries, 0 when empty
    pub average_access_count: f64,

    /// Entries past expiry that have not been purged yet
    pub expired_entries: usize,

    /// Total accesses per entry, 0 when empty
    pub memory_efficiency: f64,

    /// Lookups that returned a value
    pub hits: u64,

    /// Lookups that returned nothing
    pub misses: u64,

    /// Entries evicted to fit the byte budget
    pub evictions_lru: u64,

    /// Entries removed because they expired
    pub evictions_ttl: u64,

    /// Entries removed by delete or clear
    pub removals: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, in [0, 1]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of lookups that missed, 0 when there were none
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            1.0 - self.hit_rate()
        }
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_lru + self.evictions_ttl
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}, size: {}/{} bytes, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.entries,
            self.size_bytes,
            self.max_size_bytes,
            self.total_evictions()
        )
    }
}

/// Running counters kept alongside the entries
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions_lru: u64,
    pub evictions_ttl: u64,
    pub removals: u64,
}
