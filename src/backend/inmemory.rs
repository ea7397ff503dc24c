//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Expiry is checked on access against the tokio clock, so tests running
//! with a paused clock (`tokio::time::pause` / `advance`) control it.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }

    fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same store.
///
/// # Example
///
/// ```no_run
/// use catalog_cache::backend::{InMemoryBackend, CacheBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("f1", br#"{"id":"f1","title":"Dune"}"#.to_vec(), None).await?;
///     assert!(backend.get("f1").await?.is_some());
///
///     backend.set("f2", b"{}".to_vec(), Some(Duration::from_secs(300))).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remaining time-to-live of a live entry.
    ///
    /// `None` when the key is absent, expired, or stored without TTL.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.remaining())
    }

    /// Get memory statistics.
    pub fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();
        let expired_count = self.store.iter().filter(|entry| entry.is_expired()).count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries: expired_count,
            total_bytes,
        }
    }

    /// Remove `key` only if it is still expired; a write that landed after
    /// the caller's check survives.
    fn evict_expired(&self, key: &str) {
        self.store.remove_if(key, |_, entry| entry.is_expired());
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.store.clear();
        warn!("⚠ InMemory CLEAR executed - all cache cleared!");
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        self.evict_expired(key);
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);
        self.store.insert(key.to_string(), entry);

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired()))
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_secs(300)))
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_some());
        assert_eq!(
            backend.ttl_remaining("key1"),
            Some(Duration::from_secs(1))
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(backend.get("key1").await.expect("Failed to get").is_none());

        // Expired entry was removed on access
        assert!(backend.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_keeps_fresh_write() {
        let backend = InMemoryBackend::new();

        backend
            .set("k", b"old".to_vec(), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        // A reader saw the expired entry, then a write-back lands before it evicts
        backend
            .set("k", b"new".to_vec(), Some(Duration::from_secs(300)))
            .await
            .unwrap();
        backend.evict_expired("k");

        assert_eq!(backend.get("k").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_overwrite() {
        let backend = InMemoryBackend::new();

        backend.set("k", b"one".to_vec(), None).await.unwrap();
        backend.set("k", b"two".to_vec(), None).await.unwrap();

        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(backend.ttl_remaining("k"), None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear() {
        let backend = InMemoryBackend::new();

        backend.set("key1", b"value1".to_vec(), None).await.unwrap();
        backend.set("key2", b"value2".to_vec(), None).await.unwrap();
        assert_eq!(backend.len(), 2);

        backend.clear();
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value_with_data".to_vec(), Some(Duration::from_secs(1)))
            .await
            .expect("Failed to set");
        backend
            .set("key2", b"data".to_vec(), None)
            .await
            .expect("Failed to set");

        tokio::time::advance(Duration::from_secs(2)).await;

        let stats = backend.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.total_bytes, 19);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .set("key", b"value".to_vec(), None)
            .await
            .expect("Failed to set");

        let backend2 = backend1.clone();
        assert_eq!(
            backend2.get("key").await.expect("Failed to get"),
            Some(b"value".to_vec())
        );
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            let handle = tokio::spawn(async move {
                let key = format!("key_{}", i);
                let value = format!("value_{}", i);
                b.set(&key, value.into_bytes(), None)
                    .await
                    .expect("Failed to set");
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len(), 10);
    }
}
