//! Cache-aside service: the read path shared by every entity type.
//!
//! For each request the service runs, strictly in sequence:
//!
//! 1. Read the cache. A hit is returned as-is, without touching search.
//! 2. On a miss, read the search store (the source of truth).
//! 3. If search found something, write it back to the cache with the
//!    entity's TTL, then return it. NotFound is never cached.
//!
//! There is no invalidation path: staleness is bounded by the TTL alone.
//!
//! # Failure policy
//!
//! | Step | Failure | Outcome |
//! |------|---------|---------|
//! | cache read | store error or timeout | logged, treated as a miss |
//! | cache read | corrupt entry | returned as `Error::DeserializationError` |
//! | search read | any error | returned |
//! | search read | timeout | returned as `Error::Timeout` |
//! | write-back | any error or timeout | logged, value still returned |

use crate::backend::CacheBackend;
use crate::entity::CatalogEntity;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::models::{Film, Genre, Person};
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::params::QueryParams;
use crate::repository::{CacheRepository, Lookup, ReadRepository, SearchRepository, WriteRepository};
use crate::search::SearchBackend;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bound on a single cache call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(200);

/// Default bound on a single search call.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-service timeouts.
///
/// # Example
///
/// ```
/// use catalog_cache::service::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::default()
///     .with_cache_timeout(Duration::from_millis(50))
///     .with_search_timeout(Duration::from_secs(1));
/// assert_eq!(config.cache_timeout, Duration::from_millis(50));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bound on each cache read and write-back.
    pub cache_timeout: Duration,
    /// Bound on each search call.
    pub search_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }
}

/// Cache-aside service for one entity type.
///
/// Cheap to clone: repositories and metrics sit behind `Arc`, so one
/// instance can be shared by every request handler.
///
/// # Example
///
/// ```
/// use catalog_cache::backend::InMemoryBackend;
/// use catalog_cache::models::Film;
/// use catalog_cache::repository::{CacheRepository, Lookup, SearchRepository};
/// use catalog_cache::search::InMemorySearchBackend;
/// use catalog_cache::service::{CacheAsideService, ServiceConfig};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> catalog_cache::Result<()> {
/// let search = InMemorySearchBackend::new();
/// search.insert_entity(&Film::new("f1", "Dune"))?;
///
/// let service = CacheAsideService::new(
///     CacheRepository::<Film, _>::new(InMemoryBackend::new(), Duration::from_secs(300)),
///     SearchRepository::<Film, _>::new(search),
///     ServiceConfig::default(),
/// );
///
/// assert!(service.get_by_id("f1").await?.is_found());
/// # Ok(())
/// # }
/// ```
pub struct CacheAsideService<T, C, S> {
    cache: Arc<C>,
    search: Arc<S>,
    config: ServiceConfig,
    metrics: Arc<dyn CacheMetrics>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, C, S> Clone for CacheAsideService<T, C, S> {
    fn clone(&self) -> Self {
        CacheAsideService {
            cache: Arc::clone(&self.cache),
            search: Arc::clone(&self.search),
            config: self.config,
            metrics: Arc::clone(&self.metrics),
            _entity: PhantomData,
        }
    }
}

impl<T, C, S> CacheAsideService<T, C, S>
where
    T: CatalogEntity,
    C: ReadRepository<T> + WriteRepository<T>,
    S: ReadRepository<T>,
{
    pub fn new(cache: C, search: S, config: ServiceConfig) -> Self {
        CacheAsideService {
            cache: Arc::new(cache),
            search: Arc::new(search),
            config,
            metrics: Arc::new(NoOpMetrics),
            _entity: PhantomData,
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> ServiceConfig {
        self.config
    }

    /// Look up one entity by id.
    ///
    /// # Errors
    ///
    /// - `Error::DeserializationError`: cached or indexed value is corrupt
    /// - `Error::SearchError`: search store failed
    /// - `Error::Timeout`: search store exceeded `search_timeout`
    pub async fn get_by_id(&self, id: &str) -> Result<Lookup<T>> {
        let timer = Instant::now();
        let cache_key = CacheKeyBuilder::entity(id);

        debug!("» Cache-aside lookup for {} {}", T::index_name(), id);

        // Step 1: Cache
        if let Some(entity) = self.read_cache(&cache_key, self.cache.get_one(id)).await? {
            self.metrics.record_hit(&cache_key, timer.elapsed());
            debug!("✓ Cache hit for {} {}", T::index_name(), id);
            return Ok(Lookup::Found(entity));
        }
        self.metrics.record_miss(&cache_key, timer.elapsed());

        // Step 2: Search
        let found = self
            .read_search(&cache_key, self.search.get_one(id))
            .await?;

        // Step 3: Write-back
        match found {
            Lookup::Found(entity) => {
                self.write_back(&cache_key, self.cache.put_one(&entity))
                    .await;
                debug!(
                    "✓ Loaded {} {} from search in {:?}",
                    T::index_name(),
                    id,
                    timer.elapsed()
                );
                Ok(Lookup::Found(entity))
            }
            Lookup::NotFound => {
                debug!("{} {} not found in search", T::index_name(), id);
                Ok(Lookup::NotFound)
            }
        }
    }

    /// Look up the ordered result list for a parameter set.
    ///
    /// # Errors
    ///
    /// - `Error::ValidationError`: pagination values are invalid
    /// - otherwise the same cases as [`get_by_id`](Self::get_by_id)
    pub async fn get_by_params(&self, params: &QueryParams) -> Result<Lookup<Vec<T>>> {
        let timer = Instant::now();

        // Step 0: Reject bad pagination before touching either store
        params.limit()?;
        params.offset()?;
        let cache_key = CacheKeyBuilder::list::<T>(params)?;

        debug!("» Cache-aside list lookup for {}", cache_key);

        // Step 1: Cache
        if let Some(entities) = self
            .read_cache(&cache_key, self.cache.get_many(params))
            .await?
        {
            self.metrics.record_hit(&cache_key, timer.elapsed());
            debug!("✓ Cache hit for {} ({} items)", cache_key, entities.len());
            return Ok(Lookup::Found(entities));
        }
        self.metrics.record_miss(&cache_key, timer.elapsed());

        // Step 2: Search
        let found = self
            .read_search(&cache_key, self.search.get_many(params))
            .await?;

        // Step 3: Write-back
        match found {
            Lookup::Found(entities) => {
                self.write_back(&cache_key, self.cache.put_many(params, &entities))
                    .await;
                debug!(
                    "✓ Loaded {} items for {} from search in {:?}",
                    entities.len(),
                    cache_key,
                    timer.elapsed()
                );
                Ok(Lookup::Found(entities))
            }
            Lookup::NotFound => {
                debug!("No search results for {}", cache_key);
                Ok(Lookup::NotFound)
            }
        }
    }

    /// Run a cache read under `cache_timeout`. `Ok(None)` means "go to search".
    async fn read_cache<V>(
        &self,
        cache_key: &str,
        read: impl Future<Output = Result<Lookup<V>>> + Send,
    ) -> Result<Option<V>> {
        match tokio::time::timeout(self.config.cache_timeout, read).await {
            Ok(Ok(lookup)) => Ok(lookup.into_option()),
            Ok(Err(e)) if e.is_corrupt() => {
                self.metrics.record_error(cache_key, &e.to_string());
                Err(e)
            }
            Ok(Err(e)) => {
                warn!(
                    "Cache read failed for {}, falling back to search: {}",
                    cache_key, e
                );
                self.metrics.record_error(cache_key, &e.to_string());
                Ok(None)
            }
            Err(_) => {
                warn!(
                    "Cache read for {} timed out after {:?}, falling back to search",
                    cache_key, self.config.cache_timeout
                );
                self.metrics
                    .record_error(cache_key, "cache read timed out");
                Ok(None)
            }
        }
    }

    /// Run a search read under `search_timeout`.
    async fn read_search<V>(
        &self,
        cache_key: &str,
        read: impl Future<Output = Result<Lookup<V>>> + Send,
    ) -> Result<Lookup<V>> {
        match tokio::time::timeout(self.config.search_timeout, read).await {
            Ok(Ok(lookup)) => Ok(lookup),
            Ok(Err(e)) => {
                self.metrics.record_error(cache_key, &e.to_string());
                Err(e)
            }
            Err(_) => {
                let e = Error::Timeout(format!(
                    "search lookup for {} exceeded {:?}",
                    cache_key, self.config.search_timeout
                ));
                self.metrics.record_error(cache_key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Run a write-back under `cache_timeout`. Failures never reach the caller.
    async fn write_back(&self, cache_key: &str, write: impl Future<Output = Result<()>> + Send) {
        let timer = Instant::now();
        match tokio::time::timeout(self.config.cache_timeout, write).await {
            Ok(Ok(())) => self.metrics.record_set(cache_key, timer.elapsed()),
            Ok(Err(e)) => {
                warn!("Cache write-back failed for {}: {}", cache_key, e);
                self.metrics.record_error(cache_key, &e.to_string());
            }
            Err(_) => {
                warn!(
                    "Cache write-back for {} timed out after {:?}",
                    cache_key, self.config.cache_timeout
                );
                self.metrics
                    .record_error(cache_key, "cache write-back timed out");
            }
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Service type for one entity over concrete backends.
pub type EntityService<T, B, S> = CacheAsideService<T, CacheRepository<T, B>, SearchRepository<T, S>>;
pub type FilmService<B, S> = EntityService<Film, B, S>;
pub type GenreService<B, S> = EntityService<Genre, B, S>;
pub type PersonService<B, S> = EntityService<Person, B, S>;

/// Reachability of both stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub cache: bool,
    pub search: bool,
}

impl HealthReport {
    /// Requests can be answered as long as search is up; a cache outage
    /// only costs latency.
    pub fn is_serving(&self) -> bool {
        self.search
    }
}

/// The three per-entity services over one shared pair of backends.
///
/// Built explicitly at startup and handed to the API layer as state.
pub struct Catalog<B, S> {
    pub films: FilmService<B, S>,
    pub genres: GenreService<B, S>,
    pub persons: PersonService<B, S>,
    cache: B,
    search: S,
    config: ServiceConfig,
}

impl<B: Clone, S: Clone> Clone for Catalog<B, S> {
    fn clone(&self) -> Self {
        Catalog {
            films: self.films.clone(),
            genres: self.genres.clone(),
            persons: self.persons.clone(),
            cache: self.cache.clone(),
            search: self.search.clone(),
            config: self.config,
        }
    }
}

impl<B: CacheBackend, S: SearchBackend> Catalog<B, S> {
    pub fn new(cache: B, search: S, ttl: &TtlPolicy, config: ServiceConfig) -> Self {
        info!(
            "✓ Catalog services initialized (TTL movies={:?} genres={:?} persons={:?})",
            ttl.get_ttl(Film::index_name()),
            ttl.get_ttl(Genre::index_name()),
            ttl.get_ttl(Person::index_name()),
        );

        Catalog {
            films: Self::service(&cache, &search, ttl, config),
            genres: Self::service(&cache, &search, ttl, config),
            persons: Self::service(&cache, &search, ttl, config),
            cache,
            search,
            config,
        }
    }

    fn service<T: CatalogEntity>(
        cache: &B,
        search: &S,
        ttl: &TtlPolicy,
        config: ServiceConfig,
    ) -> EntityService<T, B, S> {
        CacheAsideService::new(
            CacheRepository::with_policy(cache.clone(), ttl),
            SearchRepository::new(search.clone()),
            config,
        )
    }

    /// Share one metrics handler across all three services.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.films = self.films.with_metrics(Arc::clone(&metrics));
        self.genres = self.genres.with_metrics(Arc::clone(&metrics));
        self.persons = self.persons.with_metrics(metrics);
        self
    }

    /// Probe both stores, each under its own timeout.
    pub async fn health(&self) -> HealthReport {
        let cache = tokio::time::timeout(self.config.cache_timeout, self.cache.health_check());
        let search = tokio::time::timeout(self.config.search_timeout, self.search.health_check());

        let (cache, search) = futures::join!(cache, search);
        let cache = matches!(cache, Ok(Ok(true)));
        let search = matches!(search, Ok(Ok(true)));

        if !cache {
            warn!("Cache store health check failed");
        }
        if !search {
            warn!("Search store health check failed");
        }
        HealthReport { cache, search }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::observability::CounterMetrics;
    use crate::search::InMemorySearchBackend;

    fn setup() -> (InMemoryBackend, InMemorySearchBackend, Catalog<InMemoryBackend, InMemorySearchBackend>) {
        let cache = InMemoryBackend::new();
        let search = InMemorySearchBackend::new();
        search
            .insert_entity(&Film::new("f1", "Dune").with_genres(["sci-fi"]))
            .unwrap();
        search.insert_entity(&Genre::new("g1", "Drama")).unwrap();
        let catalog = Catalog::new(
            cache.clone(),
            search.clone(),
            &TtlPolicy::default(),
            ServiceConfig::default(),
        );
        (cache, search, catalog)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (cache, search, catalog) = setup();
        let metrics = Arc::new(CounterMetrics::new());
        let films = catalog.films.clone().with_metrics(metrics.clone());

        let first = films.get_by_id("f1").await.unwrap();
        assert_eq!(first, Lookup::Found(Film::new("f1", "Dune").with_genres(["sci-fi"])));
        assert!(cache.exists("f1").await.unwrap());

        let second = films.get_by_id("f1").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(search.get_calls(), 1);

        let snapshot = metrics.snapshot();
        assert_eq!((snapshot.hits, snapshot.misses, snapshot.sets), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (cache, search, catalog) = setup();

        assert_eq!(catalog.films.get_by_id("f404").await.unwrap(), Lookup::NotFound);
        assert_eq!(catalog.films.get_by_id("f404").await.unwrap(), Lookup::NotFound);

        assert!(cache.is_empty());
        assert_eq!(search.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_params_touch_no_store() {
        let (cache, search, catalog) = setup();
        let params = QueryParams::new().with("limit", -1);

        let result = catalog.genres.get_by_params(&params).await;

        assert!(matches!(result, Err(Error::ValidationError(_))));
        assert!(cache.is_empty());
        assert_eq!(search.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_returned() {
        let (_cache, search, catalog) = setup();
        search.set_unavailable(true);

        let err = catalog.films.get_by_id("f1").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_catalog_health() {
        let (_cache, search, catalog) = setup();
        let report = catalog.health().await;
        assert_eq!(report, HealthReport { cache: true, search: true });
        assert!(report.is_serving());

        search.set_unavailable(true);
        let report = catalog.health().await;
        assert!(report.cache);
        assert!(!report.is_serving());
    }

    #[test]
    fn test_service_clone_shares_repositories() {
        let (_cache, _search, catalog) = setup();
        let films = catalog.films.clone();
        assert!(Arc::ptr_eq(&films.cache, &catalog.films.cache));
        assert!(Arc::ptr_eq(&films.search, &catalog.films.search));
    }
}
