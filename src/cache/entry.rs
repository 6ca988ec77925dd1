//! Cache entry management with TTL support

use crate::cache::types::CacheKey;
use crate::clock::{add_duration, elapsed_between};
use crate::generation::GenerationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached generation result with its bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request fingerprint
    pub key: CacheKey,

    /// The cached result
    pub value: GenerationResult,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Create an entry created at `now` that expires after `ttl`
    pub fn new(
        key: CacheKey,
        value: GenerationResult,
        ttl: Duration,
        size_bytes: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at: add_duration(now, ttl),
                access_count: 0,
                size_bytes,
                sequence: 0,
            },
        }
    }

    /// Whether the entry is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.metadata.expires_at
    }

    /// Time left before expiry, `None` once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired_at(now) {
            None
        } else {
            Some(elapsed_between(now, self.metadata.expires_at))
        }
    }

    /// Record a hit: bumps the access count and the recency stamps
    pub fn mark_accessed(&mut self, now: DateTime<Utc>, sequence: u64) {
        self.metadata.accessed_at = now;
        self.metadata.access_count += 1;
        self.metadata.sequence = sequence;
    }

    /// Age of the entry
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        elapsed_between(self.metadata.created_at, now)
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last access time (LRU signal)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Number of hits served from this entry
    pub access_count: u64,

    /// Estimated size in bytes
    pub size_bytes: usize,

    /// Logical recency stamp; orders entries whose access times are equal
    pub sequence: u64,
}

impl CacheMetadata {
    /// Check if the entry is frequently accessed
    pub fn is_hot(&self, threshold: u64) -> bool {
        self.access_count >= threshold
    }
}
