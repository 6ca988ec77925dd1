//! Integration tests for the result cache
//!
//! These tests verify the complete cache functionality including:
//! - Basic cache operations
//! - TTL expiration
//! - LRU eviction under the byte budget
//! - Statistics
//! - Concurrent access

use futures::future::join_all;
use imagegen_core::cache::{CacheConfig, CacheStore, SizeEstimator};
use imagegen_core::clock::ManualClock;
use imagegen_core::generation::{GenerationRequest, GenerationResult};
use std::sync::Arc;
use std::time::Duration;

fn result(prompt: &str) -> GenerationResult {
    GenerationResult::begin(&GenerationRequest::new("stability-ai/sdxl", prompt, "user-1"))
}

fn cache_on_manual_clock(config: CacheConfig) -> (CacheStore, Arc<ManualClock>) {
    let clock = ManualClock::starting_now();
    (CacheStore::with_clock(config, clock.clone()), clock)
}

#[tokio::test]
async fn test_basic_cache_operations() {
    let cache = CacheStore::new(CacheConfig::default());
    let value = result("a red bicycle");

    cache.set("key1".to_string(), value.clone(), None).await;

    assert_eq!(cache.get("key1").await, Some(value));
    assert_eq!(cache.get("missing").await, None);

    let stats = cache.statistics().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate(), 0.5);

    assert!(cache.delete("key1").await);
    assert!(!cache.delete("key1").await);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_ttl_expiration() {
    let (cache, clock) = cache_on_manual_clock(CacheConfig::default());

    cache
        .set("short".to_string(), result("short"), Some(Duration::from_secs(1)))
        .await;
    cache.set("long".to_string(), result("long"), None).await;

    // Should be available immediately
    assert!(cache.get("short").await.is_some());

    // Still there exactly at expiry
    clock.advance(Duration::from_secs(1));
    assert!(cache.contains_key("short").await);

    clock.advance(Duration::from_millis(1));
    assert!(cache.get("short").await.is_none());
    assert!(cache.get("long").await.is_some());

    // Default TTL is 24 hours
    clock.advance(Duration::from_secs(24 * 3600));
    assert!(cache.get("long").await.is_none());

    let stats = cache.statistics().await;
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.evictions_ttl, 2);
}

#[tokio::test]
async fn test_lru_eviction_under_budget() {
    let entry_size = SizeEstimator::default().estimate(&result("p0"));
    let config = CacheConfig::builder()
        .max_size_bytes(entry_size * 5 / 2)
        .build();
    let (cache, clock) = cache_on_manual_clock(config);

    cache.set("first".to_string(), result("p0"), None).await;
    clock.advance(Duration::from_secs(1));
    cache.set("second".to_string(), result("p1"), None).await;
    clock.advance(Duration::from_secs(1));

    // Touch "first" so "second" becomes least recently used
    assert!(cache.get("first").await.is_some());
    clock.advance(Duration::from_secs(1));

    cache.set("third".to_string(), result("p2"), None).await;

    assert!(cache.contains_key("first").await);
    assert!(!cache.contains_key("second").await);
    assert!(cache.contains_key("third").await);

    let stats = cache.statistics().await;
    assert_eq!(stats.evictions_lru, 1);
    assert!(stats.size_bytes <= stats.max_size_bytes);
}

#[tokio::test]
async fn test_budget_holds_after_many_inserts() {
    let entry_size = SizeEstimator::default().estimate(&result("p0"));
    let config = CacheConfig::builder()
        .max_size_bytes(entry_size * 10)
        .build();
    let (cache, clock) = cache_on_manual_clock(config);

    for i in 0..50 {
        cache.set(format!("key{}", i), result(&format!("p{}", i)), None).await;
        clock.advance(Duration::from_millis(10));
        assert!(cache.size_bytes().await <= entry_size * 10);
    }

    assert_eq!(cache.len().await, 10);
    // The newest entries survive
    assert!(cache.contains_key("key49").await);
    assert!(!cache.contains_key("key0").await);
}

#[tokio::test]
async fn test_statistics_and_clear() {
    let (cache, _clock) = cache_on_manual_clock(CacheConfig::default());

    cache.set("a".to_string(), result("a"), None).await;
    cache.set("b".to_string(), result("b"), None).await;
    cache.get("a").await;
    cache.get("a").await;

    let stats = cache.statistics().await;
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.average_access_count, 1.0);
    assert_eq!(stats.memory_efficiency, 1.0);
    assert!(stats.size_utilization > 0.0);

    cache.clear().await;
    let stats = cache.statistics().await;
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.size_bytes, 0);
    assert_eq!(stats.removals, 2);
}

#[tokio::test]
async fn test_concurrent_access() {
    let cache = Arc::new(CacheStore::new(CacheConfig::default()));

    let writers = (0..20).map(|i| {
        let cache = Arc::clone(&cache);
        async move {
            cache
                .set(format!("key{}", i), result(&format!("prompt {}", i)), None)
                .await;
        }
    });
    join_all(writers).await;

    let readers = (0..20).map(|i| {
        let cache = Arc::clone(&cache);
        async move { cache.get(&format!("key{}", i)).await.is_some() }
    });
    let found = join_all(readers).await;

    assert!(found.into_iter().all(|hit| hit));
    assert_eq!(cache.len().await, 20);
    assert_eq!(cache.statistics().await.hits, 20);
}

#[tokio::test]
async fn test_background_cleanup() {
    let config = CacheConfig::builder()
        .default_ttl(Duration::from_millis(20))
        .cleanup_interval(Duration::from_millis(10))
        .build();
    let cache = Arc::new(CacheStore::new(config));

    cache.set("key".to_string(), result("p"), None).await;
    let task = cache.start_auto_cleanup().expect("cleanup enabled");

    tokio::time::sleep(Duration::from_millis(100)).await;
    task.cancel();

    // Purged by the sweep, not by a lookup
    assert_eq!(cache.len().await, 0);
    assert_eq!(cache.statistics().await.misses, 0);
}
