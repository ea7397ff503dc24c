//! Redis cache backend implementation.

use super::CacheBackend;
use crate::error::{Error, Result};
use deadpool_redis::{
    redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime, Timeouts,
};
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Override with REDIS_POOL_SIZE environment variable
pub const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    /// Upper bound for waiting on, creating and recycling a pooled connection.
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        if let Some(password) = &self.password {
            if let Some(username) = &self.username {
                format!(
                    "redis://{}:{}@{}:{}/{}",
                    username, password, self.host, self.port, self.database
                )
            } else {
                format!(
                    "redis://default:{}@{}:{}/{}",
                    password, self.host, self.port, self.database
                )
            }
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// Redis backend with connection pooling and async operations.
///
/// The pool is built once at startup and shared by every request.
///
/// # Example
///
/// ```no_run
/// # use catalog_cache::backend::{RedisBackend, RedisConfig, CacheBackend};
/// # use catalog_cache::error::Result;
/// # async fn example() -> Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default()).await?;
///
/// backend.set("f1", br#"{"id":"f1","title":"Dune"}"#.to_vec(), None).await?;
/// let value = backend.get("f1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.connection_string());
        let mut pool_cfg = deadpool_redis::PoolConfig::new(config.pool_size as usize);
        pool_cfg.timeouts = Timeouts {
            wait: Some(config.connection_timeout),
            create: Some(config.connection_timeout),
            recycle: Some(config.connection_timeout),
        };
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized: {}:{} (pool size: {})",
            config.host, config.port, config.pool_size
        );

        Ok(RedisBackend { pool })
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

/// Expiry for `SET PX`: whole milliseconds rounded up, at least 1 (Redis rejects 0).
fn ttl_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_nanos().div_ceil(1_000_000).max(1);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        match ttl {
            Some(duration) => {
                let millis = ttl_millis(duration);
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(|e| {
                        Error::BackendError(format!("Redis SET_PX failed for key {}: {}", key, e))
                    })?;
                debug!("✓ Redis SET {} (TTL: {}ms)", key, millis);
            }
            None => {
                conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                    Error::BackendError(format!("Redis SET failed for key {}: {}", key, e))
                })?;
                debug!("✓ Redis SET {}", key);
            }
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;

        let exists: bool = conn.exists(key).await.map_err(|e| {
            Error::BackendError(format!("Redis EXISTS failed for key {}: {}", key, e))
        })?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong.contains("PONG"))
    }
}
