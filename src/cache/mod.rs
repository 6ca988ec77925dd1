//! # Result Cache
//!
//! Bounded store of generation results keyed by request fingerprint.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: every entry carries an absolute expiry (24 hours by default)
//! - **LRU Eviction**: least recently used entries are evicted while the byte budget is exceeded
//! - **Size Estimation**: entry sizes come from the serialized result
//! - **Statistics**: utilization, access counts, hit rate and eviction counters
//!
//! Expiry is enforced lazily on lookup and by a purge before each insert; an
//! optional background sweep removes stale entries in between.
//!
//! ## Example
//!
//! ```rust
//! use imagegen_core::cache::{CacheConfig, CacheStore};
//! use imagegen_core::generation::{GenerationRequest, GenerationResult};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let config = CacheConfig::builder()
//!     .default_ttl(Duration::from_secs(3600))
//!     .max_size_bytes(10 * 1024 * 1024)
//!     .build();
//!
//! let cache = CacheStore::new(config);
//!
//! let request = GenerationRequest::new("stability-ai/sdxl", "a lighthouse at dusk", "user-1");
//! cache.set("fingerprint".to_string(), GenerationResult::begin(&request), None).await;
//!
//! if let Some(result) = cache.get("fingerprint").await {
//!     println!("Cache hit: {}", result.status);
//! }
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod eviction;
pub mod size;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use eviction::{EvictionEvent, EvictionReason};
pub use size::SizeEstimator;
pub use store::CacheStore;
pub use types::{CacheKey, CacheStats};
