//! Repository contract and its two implementations.
//!
//! Every entity type has a repository pair:
//!
//! - [`CacheRepository`]: reads and writes the cache store. Implements both
//!   [`ReadRepository`] and [`WriteRepository`].
//! - [`SearchRepository`]: reads the search store, the source of truth.
//!   Implements [`ReadRepository`] only.
//!
//! A miss is never an error. Both repositories return [`Lookup::NotFound`]
//! for "nothing there" and reserve `Err` for failures (store unreachable,
//! stored value corrupt, invalid parameters), so callers can tell the two
//! apart by pattern matching.

use crate::backend::CacheBackend;
use crate::entity::CatalogEntity;
use crate::error::Result;
use crate::key::CacheKeyBuilder;
use crate::observability::TtlPolicy;
use crate::params::QueryParams;
use crate::search::{SearchBackend, SearchQuery};
use crate::serialization;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

/// Outcome of a lookup that completed without failure.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}

/// Read capability, shared by the cache and search sides.
pub trait ReadRepository<T: CatalogEntity>: Send + Sync {
    /// Fetch one entity by id.
    ///
    /// # Errors
    /// Returns `Err` if the store fails or the stored value is corrupt.
    fn get_one(&self, id: &str) -> impl Future<Output = Result<Lookup<T>>> + Send;

    /// Fetch the ordered result list for a parameter set.
    ///
    /// An empty result is `Lookup::NotFound`.
    ///
    /// # Errors
    /// Returns `Err` if the store fails, the stored value is corrupt, or the
    /// parameters are invalid.
    fn get_many(&self, params: &QueryParams)
        -> impl Future<Output = Result<Lookup<Vec<T>>>> + Send;
}

/// Write capability, cache side only.
pub trait WriteRepository<T: CatalogEntity>: Send + Sync {
    /// Store one entity under its id.
    ///
    /// # Errors
    /// Returns `Err` if encoding or the store write fails.
    fn put_one(&self, entity: &T) -> impl Future<Output = Result<()>> + Send;

    /// Store an ordered result list under the list key for `params`.
    ///
    /// # Errors
    /// Returns `Err` if encoding or the store write fails.
    fn put_many(
        &self,
        params: &QueryParams,
        entities: &[T],
    ) -> impl Future<Output = Result<()>> + Send;
}

// ============================================================================
// Cache repository
// ============================================================================

/// Repository over the cache store with a fixed per-entity TTL.
pub struct CacheRepository<T, B> {
    backend: B,
    ttl: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CatalogEntity, B: CacheBackend> CacheRepository<T, B> {
    pub fn new(backend: B, ttl: Duration) -> Self {
        CacheRepository {
            backend,
            ttl,
            _entity: PhantomData,
        }
    }

    /// Build with the TTL the policy assigns to `T`'s index.
    pub fn with_policy(backend: B, policy: &TtlPolicy) -> Self {
        Self::new(backend, policy.get_ttl(T::index_name()))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<T, B: Clone> Clone for CacheRepository<T, B> {
    fn clone(&self) -> Self {
        CacheRepository {
            backend: self.backend.clone(),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<T: CatalogEntity, B: CacheBackend> ReadRepository<T> for CacheRepository<T, B> {
    async fn get_one(&self, id: &str) -> Result<Lookup<T>> {
        let key = CacheKeyBuilder::entity(id);
        let Some(bytes) = self.backend.get(&key).await? else {
            return Ok(Lookup::NotFound);
        };

        let entity = T::deserialize_from_cache(&bytes)?;
        entity.validate()?;
        Ok(Lookup::Found(entity))
    }

    async fn get_many(&self, params: &QueryParams) -> Result<Lookup<Vec<T>>> {
        let key = CacheKeyBuilder::list::<T>(params)?;
        let Some(bytes) = self.backend.get(&key).await? else {
            return Ok(Lookup::NotFound);
        };

        let entities: Vec<T> = serialization::decode_list(&bytes)?;
        for entity in &entities {
            entity.validate()?;
        }

        if entities.is_empty() {
            return Ok(Lookup::NotFound);
        }
        Ok(Lookup::Found(entities))
    }
}

impl<T: CatalogEntity, B: CacheBackend> WriteRepository<T> for CacheRepository<T, B> {
    async fn put_one(&self, entity: &T) -> Result<()> {
        let key = CacheKeyBuilder::entity(entity.id());
        let bytes = entity.serialize_for_cache()?;
        self.backend.set(&key, bytes, Some(self.ttl)).await
    }

    async fn put_many(&self, params: &QueryParams, entities: &[T]) -> Result<()> {
        let key = CacheKeyBuilder::list::<T>(params)?;
        let bytes = serialization::encode_list(entities)?;
        self.backend.set(&key, bytes, Some(self.ttl)).await
    }
}

// ============================================================================
// Search repository
// ============================================================================

/// Read-only repository over the search store, bound to `T`'s index.
pub struct SearchRepository<T, S> {
    backend: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T: CatalogEntity, S: SearchBackend> SearchRepository<T, S> {
    pub fn new(backend: S) -> Self {
        SearchRepository {
            backend,
            _entity: PhantomData,
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}

impl<T, S: Clone> Clone for SearchRepository<T, S> {
    fn clone(&self) -> Self {
        SearchRepository {
            backend: self.backend.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: CatalogEntity, S: SearchBackend> ReadRepository<T> for SearchRepository<T, S> {
    async fn get_one(&self, id: &str) -> Result<Lookup<T>> {
        let Some(document) = self.backend.get_document(T::index_name(), id).await? else {
            return Ok(Lookup::NotFound);
        };

        let entity = T::from_document(document)?;
        entity.validate()?;
        Ok(Lookup::Found(entity))
    }

    async fn get_many(&self, params: &QueryParams) -> Result<Lookup<Vec<T>>> {
        let query = SearchQuery::for_entity::<T>(params)?;
        let documents = self.backend.search(T::index_name(), &query).await?;

        if documents.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let mut entities = Vec::with_capacity(documents.len());
        for document in documents {
            let entity = T::from_document(document)?;
            entity.validate()?;
            entities.push(entity);
        }
        Ok(Lookup::Found(entities))
    }
}
