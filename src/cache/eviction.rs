//! Why entries leave the cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason an entry was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvictionReason {
    /// Entry was past its expiry
    Expired,

    /// Removed to fit the byte budget
    LeastRecentlyUsed,

    /// Removed by an explicit delete or clear
    Manual,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionReason::Expired => write!(f, "TTL expired"),
            EvictionReason::LeastRecentlyUsed => write!(f, "LRU eviction"),
            EvictionReason::Manual => write!(f, "manual removal"),
        }
    }
}

/// A batch of keys removed for the same reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionEvent {
    pub reason: EvictionReason,

    /// When the removal happened
    pub timestamp: DateTime<Utc>,

    /// Keys that were removed
    pub keys: Vec<String>,

    /// Bytes released
    pub freed_bytes: usize,
}

impl EvictionEvent {
    pub fn new(reason: EvictionReason, timestamp: DateTime<Utc>) -> Self {
        Self {
            reason,
            timestamp,
            keys: Vec::new(),
            freed_bytes: 0,
        }
    }

    pub(crate) fn record(&mut self, key: String, size_bytes: usize) {
        self.keys.push(key);
        self.freed_bytes += size_bytes;
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_reason_display() {
        assert_eq!(EvictionReason::Expired.to_string(), "TTL expired");
        assert_eq!(EvictionReason::LeastRecentlyUsed.to_string(), "LRU eviction");
        assert_eq!(EvictionReason::Manual.to_string(), "manual removal");
    }

    #[test]
    fn test_eviction_event_accumulates() {
        let mut event = EvictionEvent::new(EvictionReason::Expired, Utc::now());
        assert!(event.is_empty());

        event.record("a".to_string(), 100);
        event.record("b".to_string(), 50);

        assert_eq!(event.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(event.freed_bytes, 150);
    }
}
