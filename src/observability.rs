//! Metrics hooks and cache entry TTL policies.
//!
//! Observability is split into two concerns:
//!
//! - **Metrics (`CacheMetrics`)**: hits, misses, write-backs, absorbed errors
//! - **TTL Policies (`TtlPolicy`)**: how long entries of each type live
//!
//! # Metrics
//!
//! Implement `CacheMetrics` to feed your monitoring system:
//!
//! ```ignore
//! use catalog_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("catalog_cache_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//! ```
//!
//! Services default to `NoOpMetrics`. `LogMetrics` reports every event via
//! the `log` crate, `CounterMetrics` keeps atomic totals.
//!
//! # TTL Policies
//!
//! ```
//! use catalog_cache::observability::TtlPolicy;
//! use std::time::Duration;
//!
//! // Same TTL for every entity type
//! let fixed = TtlPolicy::Fixed(Duration::from_secs(300));
//! assert_eq!(fixed.get_ttl("movies"), Duration::from_secs(300));
//!
//! // Different TTL per index
//! let per_type = TtlPolicy::PerType(|index| match index {
//!     "genres" => Duration::from_secs(3600),
//!     _ => Duration::from_secs(300),
//! });
//! assert_eq!(per_type.get_ttl("genres"), Duration::from_secs(3600));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// TTL applied when nothing else is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss (absent, expired, or an absorbed cache failure).
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a successful write-back.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record an error on either store.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Logs every event through the `log` facade.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// Point-in-time copy of `CounterMetrics` totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl MetricsSnapshot {
    /// Fraction of lookups served from cache, 0.0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Lock-free event counters.
#[derive(Default)]
pub struct CounterMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl CounterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CounterMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _key: &str, _duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_set(&self, _key: &str, _duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, _key: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// TTL (Time-to-Live) policy for cache entries, keyed by index name.
#[derive(Clone, Debug)]
pub enum TtlPolicy {
    /// Fixed duration for all entries
    Fixed(Duration),

    /// Custom per-type policy
    PerType(fn(&str) -> Duration),

    /// Per-index overrides on top of a default, as loaded from configuration
    PerIndex {
        default: Duration,
        overrides: HashMap<String, Duration>,
    },
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::Fixed(DEFAULT_TTL)
    }
}

impl TtlPolicy {
    /// Get TTL for an index.
    pub fn get_ttl(&self, index: &str) -> Duration {
        match self {
            TtlPolicy::Fixed(d) => *d,
            TtlPolicy::PerType(f) => f(index),
            TtlPolicy::PerIndex { default, overrides } => {
                overrides.get(index).copied().unwrap_or(*default)
            }
        }
    }
}
