//! Main cache store implementation with TTL expiry and LRU eviction under a byte budget

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    eviction::{EvictionEvent, EvictionReason},
    size::SizeEstimator,
    types::{CacheCounters, CacheKey, CacheStats},
};
use crate::clock::{SharedClock, SystemClock};
use crate::generation::GenerationResult;
use crate::ticker::RecurringTask;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Bounded store of generation results keyed by request fingerprint
///
/// This implementation provides:
/// - Async access via RwLock, safe to share behind an `Arc`
/// - Lazy TTL expiry on lookup, plus a purge before every insert
/// - LRU eviction while the byte budget would be exceeded
/// - Hit/miss and eviction counters
pub struct CacheStore {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    state: RwLock<CacheState>,

    estimator: SizeEstimator,

    clock: SharedClock,
}

/// Internal cache storage
struct CacheState {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Total estimated size of stored entries in bytes
    current_size_bytes: usize,

    /// Next logical recency stamp
    next_sequence: u64,

    counters: CacheCounters,
}

impl CacheState {
    fn stamp(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.current_size_bytes = self
            .current_size_bytes
            .saturating_sub(entry.metadata.size_bytes);
        Some(entry)
    }

    /// Key of the least recently used entry; access time first, then recency stamp
    fn lru_key(&self) -> Option<CacheKey> {
        self.entries
            .values()
            .min_by_key(|e| (e.metadata.accessed_at, e.metadata.sequence))
            .map(|e| e.key.clone())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> EvictionEvent {
        let mut event = EvictionEvent::new(EvictionReason::Expired, now);

        let expired: Vec<CacheKey> = self
            .entries
            .values()
            .filter(|e| e.is_expired_at(now))
            .map(|e| e.key.clone())
            .collect();

        for key in expired {
            if let Some(entry) = self.remove(&key) {
                event.record(key, entry.metadata.size_bytes);
            }
        }

        self.counters.evictions_ttl += event.keys.len() as u64;
        event
    }
}

impl CacheStore {
    /// Create a new cache on the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Create a cache that reads time from `clock`
    pub fn with_clock(config: CacheConfig, clock: SharedClock) -> Self {
        info!("Initializing result cache with config: {:?}", config);

        let state = CacheState {
            entries: HashMap::new(),
            current_size_bytes: 0,
            next_sequence: 0,
            counters: CacheCounters::default(),
        };

        Self {
            config,
            state: RwLock::new(state),
            estimator: SizeEstimator::default(),
            clock,
        }
    }

    /// Replace the size estimator
    pub fn with_estimator(mut self, estimator: SizeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store or replace the result under `key`
    ///
    /// Expired entries are purged first, then least recently used entries are
    /// evicted until the new entry fits. An entry larger than the whole budget
    /// is stored alone once everything else has been evicted.
    pub async fn set(&self, key: CacheKey, value: GenerationResult, ttl: Option<Duration>) {
        let now = self.clock.now();
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let size = self.estimator.estimate(&value);
        let budget = self.config.max_size_bytes;

        let mut state = self.state.write().await;

        let expired = state.purge_expired(now);
        if !expired.is_empty() {
            debug!(
                "Purged {} expired entries ({} bytes) before insert",
                expired.keys.len(),
                expired.freed_bytes
            );
        }

        if let Some(previous) = state.remove(&key) {
            debug!(
                "Replacing cache entry: {} ({} -> {} bytes)",
                key, previous.metadata.size_bytes, size
            );
        }

        while state.current_size_bytes + size > budget && !state.entries.is_empty() {
            let Some(victim) = state.lru_key() else { break };
            if let Some(evicted) = state.remove(&victim) {
                debug!(
                    "Evicting entry due to size limit: {} ({} bytes)",
                    victim, evicted.metadata.size_bytes
                );
                state.counters.evictions_lru += 1;
            }
        }

        if size > budget {
            warn!(
                "Cache entry {} ({} bytes) exceeds the {} byte budget, storing it alone",
                key, size, budget
            );
        }

        let mut entry = CacheEntry::new(key.clone(), value, ttl, size, now);
        entry.metadata.sequence = state.stamp();
        state.entries.insert(key.clone(), entry);
        state.current_size_bytes += size;

        debug!("Inserted cache entry: {} ({} bytes, ttl {:?})", key, size, ttl);
    }

    /// Look up a live result, refreshing its recency on a hit
    ///
    /// An expired entry is removed and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<GenerationResult> {
        let now = self.clock.now();
        let mut state = self.state.write().await;

        let Some(expired) = state.entries.get(key).map(|e| e.is_expired_at(now)) else {
            debug!("Cache miss: {}", key);
            state.counters.misses += 1;
            return None;
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            state.remove(key);
            state.counters.misses += 1;
            state.counters.evictions_ttl += 1;
            return None;
        }

        let sequence = state.stamp();
        state.counters.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.mark_accessed(now, sequence);

        debug!("Cache hit: {}", key);
        Some(entry.value.clone())
    }

    /// Remove the entry under `key`; returns whether one was present
    pub async fn delete(&self, key: &str) -> bool {
        let mut state = self.state.write().await;

        if state.remove(key).is_some() {
            state.counters.removals += 1;
            debug!("Removed cache entry: {}", key);
            true
        } else {
            false
        }
    }

    /// Check if a live entry exists without touching its recency or the hit counters
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        let state = self.state.read().await;
        state
            .entries
            .get(key)
            .is_some_and(|e| !e.is_expired_at(now))
    }

    /// Most recently created live result matching `predicate`
    ///
    /// Read-only: neither recency nor hit counters change.
    pub async fn find_latest<P>(&self, predicate: P) -> Option<GenerationResult>
    where
        P: Fn(&GenerationResult) -> bool,
    {
        let now = self.clock.now();
        let state = self.state.read().await;

        state
            .entries
            .values()
            .filter(|e| !e.is_expired_at(now) && predicate(&e.value))
            .max_by_key(|e| (e.metadata.created_at, e.metadata.sequence))
            .map(|e| e.value.clone())
    }

    /// Snapshot of every live result
    pub async fn live_values(&self) -> Vec<GenerationResult> {
        let now = self.clock.now();
        let state = self.state.read().await;

        state
            .entries
            .values()
            .filter(|e| !e.is_expired_at(now))
            .map(|e| e.value.clone())
            .collect()
    }

    /// Remove all expired entries
    pub async fn purge_expired(&self) -> EvictionEvent {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let event = state.purge_expired(now);

        if !event.is_empty() {
            debug!("Cleaned up {} expired entries", event.keys.len());
        }

        event
    }

    /// Clear all entries from the cache
    pub async fn clear(&self) {
        let mut state = self.state.write().await;

        let count = state.entries.len();
        state.entries.clear();
        state.current_size_bytes = 0;
        state.counters.removals += count as u64;

        info!("Cleared {} entries from cache", count);
    }

    /// Current statistics
    ///
    /// Expired entries are still counted until a lookup, insert or sweep
    /// removes them; `expired_entries` reports how many there are.
    pub async fn statistics(&self) -> CacheStats {
        let now = self.clock.now();
        let state = self.state.read().await;

        let entries = state.entries.len();
        let total_accesses: u64 = state
            .entries
            .values()
            .map(|e| e.metadata.access_count)
            .sum();
        let expired_entries = state
            .entries
            .values()
            .filter(|e| e.is_expired_at(now))
            .count();
        let average_access_count = if entries == 0 {
            0.0
        } else {
            total_accesses as f64 / entries as f64
        };

        CacheStats {
            entries,
            size_bytes: state.current_size_bytes,
            max_size_bytes: self.config.max_size_bytes,
            size_utilization: state.current_size_bytes as f64
                / self.config.max_size_bytes.max(1) as f64
                * 100.0,
            average_access_count,
            expired_entries,
            memory_efficiency: average_access_count,
            hits: state.counters.hits,
            misses: state.counters.misses,
            evictions_lru: state.counters.evictions_lru,
            evictions_ttl: state.counters.evictions_ttl,
            removals: state.counters.removals,
        }
    }

    /// Get current cache size in bytes
    pub async fn size_bytes(&self) -> usize {
        self.state.read().await.current_size_bytes
    }

    /// Get number of entries in cache
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Start the background expiry sweep, if enabled
    pub fn start_auto_cleanup(self: &Arc<Self>) -> Option<RecurringTask> {
        if !self.config.enable_auto_cleanup {
            return None;
        }

        let cache = Arc::clone(self);
        Some(RecurringTask::spawn(
            "cache-cleanup",
            self.config.cleanup_interval,
            move || {
                let cache = Arc::clone(&cache);
                async move {
                    let event = cache.purge_expired().await;
                    if !event.is_empty() {
                        debug!("Auto cleanup: {} entries expired", event.keys.len());
                    }
                }
            },
        ))
    }
}
