//! Read-through cache decorator.
//!
//! Callers hand over a key and the computation that produces the value. On
//! a hit the stored payload is returned without running the computation; on
//! a miss it runs once and the result is stored. Failed computations are
//! never cached.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use techstacks_core::{CacheError, TechStacksResult};

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheEntry, CacheStats};

/// Configuration for the read-through cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every lookup computes and nothing is stored.
    pub enabled: bool,
    /// Entry cap for the in-memory backend.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the max entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Create CacheConfig from environment variables.
    ///
    /// - `TECHSTACKS_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `TECHSTACKS_CACHE_MAX_ENTRIES` (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("TECHSTACKS_CACHE_ENABLED")
                .ok()
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(defaults.enabled),
            max_entries: std::env::var("TECHSTACKS_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_entries),
        }
    }
}

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

/// A value returned through the cache, tagged with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    pub value: T,
    pub outcome: CacheOutcome,
}

impl<T> CacheRead<T> {
    pub fn is_hit(&self) -> bool {
        self.outcome == CacheOutcome::Hit
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Read-through cache over a pluggable backend.
pub struct ReadThroughCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl ReadThroughCache {
    /// Create a new read-through cache.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    /// Create a new read-through cache with default configuration.
    pub fn with_defaults(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, CacheConfig::default())
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached value for `key`, or run `compute` and store its
    /// result.
    ///
    /// A stored payload that no longer deserializes as `T` is treated as a
    /// miss and overwritten.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> TechStacksResult<CacheRead<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = TechStacksResult<T>>,
    {
        if !self.config.enabled {
            return Ok(CacheRead {
                value: compute().await?,
                outcome: CacheOutcome::Miss,
            });
        }

        if let Some(entry) = self.backend.get(key).await? {
            if let Ok(value) = serde_json::from_value::<T>(entry.payload) {
                return Ok(CacheRead {
                    value,
                    outcome: CacheOutcome::Hit,
                });
            }
        }

        let value = compute().await?;
        let payload = serde_json::to_value(&value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.backend.put(key, CacheEntry::new(payload)).await?;
        Ok(CacheRead {
            value,
            outcome: CacheOutcome::Miss,
        })
    }

    /// Remove one key.
    pub async fn remove(&self, key: &CacheKey) -> TechStacksResult<bool> {
        self.backend.remove(key).await
    }

    /// Remove every key.
    pub async fn flush_all(&self) -> TechStacksResult<u64> {
        self.backend.flush_all().await
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> TechStacksResult<CacheStats> {
        self.backend.stats().await
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
