//! Cache backend trait and statistics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use techstacks_core::TechStacksResult;

use super::key::CacheKey;

/// A serialized response payload plus the time it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            cached_at: Utc::now(),
        }
    }
}

/// Cache backend trait for pluggable cache implementations.
///
/// Entries stay valid until explicitly removed or flushed; there is no
/// time-based expiry. Implementations must be safe to share across tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get an entry. Counts a hit or a miss.
    async fn get(&self, key: &CacheKey) -> TechStacksResult<Option<CacheEntry>>;

    /// Store or replace an entry.
    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> TechStacksResult<()>;

    /// Remove one entry. Returns whether it existed.
    async fn remove(&self, key: &CacheKey) -> TechStacksResult<bool>;

    /// Remove every entry. Returns the number removed.
    async fn flush_all(&self) -> TechStacksResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> TechStacksResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of explicit full flushes.
    pub flushes: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);
        assert!((CacheStats::default().hit_rate() - 0.0).abs() < 0.001);
    }
}
