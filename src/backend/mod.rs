//! Cache store backends.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for cache store implementations.
///
/// A plain key/value store with expiry. Absence is not an error.
///
/// **IMPORTANT:** All methods use `&self` so one long-lived handle can be
/// shared by every request. Implementations use interior mutability or an
/// external store.
///
/// **ASYNC:** Every returned future is `Send`, so callers can be spawned on a
/// multi-threaded runtime (and used from axum handlers) while generic over
/// the backend.
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (absent or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store value in cache with optional TTL.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Serialized bytes
    /// - `ttl`: Time-to-live. None = no expiry
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Check if key exists in cache.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}
