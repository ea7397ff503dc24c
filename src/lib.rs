//! # catalog-cache
//!
//! Read-through cached access to a film catalog (films, genres, persons).
//! A search engine is the source of truth; a TTL cache in front of it
//! absorbs repeated lookups.
//!
//! ## Features
//!
//! - **One read path for every entity:** [`CacheAsideService`] runs
//!   cache → search → write-back for any [`CatalogEntity`]
//! - **Parameterized list caching:** list results are cached under a key
//!   built from the full parameter mapping, independent of insertion order
//! - **Backend agnostic:** in-memory stores for tests, Redis and
//!   Elasticsearch behind the `redis` and `elasticsearch` features
//! - **Explicit NotFound:** absence is [`Lookup::NotFound`], never an error,
//!   and is never cached
//! - **Bounded staleness:** entries expire after their TTL, there is no
//!   invalidation path
//!
//! ## Quick Start
//!
//! ```
//! use catalog_cache::{
//!     backend::InMemoryBackend,
//!     models::Film,
//!     observability::TtlPolicy,
//!     search::InMemorySearchBackend,
//!     service::{Catalog, ServiceConfig},
//!     Lookup, QueryParams,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> catalog_cache::Result<()> {
//! // 1. Source of truth
//! let search = InMemorySearchBackend::new();
//! search.insert_entity(&Film::new("f1", "Dune").with_genres(["sci-fi"]))?;
//!
//! // 2. Services over a cache and the search store
//! let catalog = Catalog::new(
//!     InMemoryBackend::new(),
//!     search,
//!     &TtlPolicy::default(),
//!     ServiceConfig::default(),
//! );
//!
//! // 3. Single entity: miss, search, write-back
//! let film = catalog.films.get_by_id("f1").await?;
//! assert!(film.is_found());
//!
//! // 4. Filtered list
//! let params = QueryParams::new().with("genres", vec!["sci-fi"]);
//! let films = catalog.films.get_by_params(&params).await?;
//! assert!(matches!(films, Lookup::Found(ref list) if list.len() == 1));
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod backend;
pub mod config;
pub mod entity;
pub mod error;
pub mod key;
pub mod models;
pub mod observability;
pub mod params;
pub mod repository;
pub mod search;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use entity::CatalogEntity;
pub use error::{Error, Result};
pub use params::QueryParams;
pub use repository::{Lookup, ReadRepository, WriteRepository};
pub use search::SearchBackend;
pub use service::{CacheAsideService, Catalog, ServiceConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
