//! Process-local cache backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use techstacks_core::{CacheError, TechStacksResult};

use super::key::CacheKey;
use super::traits::{CacheBackend, CacheEntry, CacheStats};

/// HashMap-backed cache with an optional entry cap.
///
/// When the cap is reached the oldest entry is evicted.
#[derive(Debug)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    flushes: AtomicU64,
    evictions: AtomicU64,
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Whether a key is currently stored. Does not touch hit/miss counters.
    pub fn contains(&self, key: &CacheKey) -> TechStacksResult<bool> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.contains_key(key))
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> TechStacksResult<Option<CacheEntry>> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        let found = entries.get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> TechStacksResult<()> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.cached_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> TechStacksResult<bool> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    async fn flush_all(&self) -> TechStacksResult<u64> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let removed = entries.len() as u64;
        entries.clear();
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(removed)
    }

    async fn stats(&self) -> TechStacksResult<CacheStats> {
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entries.len() as u64,
            flushes: self.flushes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_put_remove() {
        let backend = InMemoryCacheBackend::new();
        let key = CacheKey::stack("rust");
        assert!(backend.get(&key).await.unwrap().is_none());

        backend.put(&key, CacheEntry::new(json!({"id": 1}))).await.unwrap();
        let entry = backend.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.payload, json!({"id": 1}));

        assert!(backend.remove(&key).await.unwrap());
        assert!(!backend.remove(&key).await.unwrap());

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_flush_all_clears_every_key() {
        let backend = InMemoryCacheBackend::new();
        backend.put(&CacheKey::overview(), CacheEntry::new(json!(1))).await.unwrap();
        backend.put(&CacheKey::find_stacks("q=1"), CacheEntry::new(json!(2))).await.unwrap();

        assert_eq!(backend.flush_all().await.unwrap(), 2);
        assert!(!backend.contains(&CacheKey::overview()).unwrap());
        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.flushes, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let backend = InMemoryCacheBackend::with_capacity(2);
        let base = chrono::Utc::now();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let entry = CacheEntry {
                payload: json!(i),
                cached_at: base + chrono::Duration::seconds(i as i64),
            };
            backend.put(&CacheKey::stack(name), entry).await.unwrap();
        }
        assert!(!backend.contains(&CacheKey::stack("a")).unwrap());
        assert!(backend.contains(&CacheKey::stack("c")).unwrap());
        assert_eq!(backend.stats().await.unwrap().evictions, 1);
    }
}
