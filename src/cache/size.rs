//! Byte footprint estimation for cached results

use serde::Serialize;
use tracing::warn;

/// Estimates how many bytes a value occupies once serialized
///
/// The estimate is the JSON length times a per-character weight (UTF-16 code
/// units by default). When serialization fails the fallback size is used, so
/// a bad value can never block a cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimator {
    bytes_per_char: usize,
    fallback_bytes: usize,
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self {
            bytes_per_char: 2,
            fallback_bytes: 1024,
        }
    }
}

impl SizeEstimator {
    pub fn new(bytes_per_char: usize, fallback_bytes: usize) -> Self {
        Self {
            bytes_per_char: bytes_per_char.max(1),
            fallback_bytes,
        }
    }

    /// Estimated size of `value` in bytes
    pub fn estimate<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        match serde_json::to_string(value) {
            Ok(json) => json.len().saturating_mul(self.bytes_per_char),
            Err(e) => {
                warn!("Size estimation failed, using fallback of {} bytes: {}", self.fallback_bytes, e);
                self.fallback_bytes
            }
        }
    }
}
