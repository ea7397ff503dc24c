//! Search store backends.
//!
//! The search store is the source of truth for catalog data. Only two
//! operations are needed: fetch one document by id, and run a filtered,
//! paginated search whose hits come back in relevance order.

use crate::error::Result;
use std::future::Future;

#[cfg(feature = "elasticsearch")]
pub mod elastic;
pub mod inmemory;
pub mod query;

#[cfg(feature = "elasticsearch")]
pub use elastic::{ElasticsearchBackend, ElasticsearchConfig};
pub use inmemory::InMemorySearchBackend;
pub use query::{SearchQuery, TermClause};

/// Trait for search store implementations.
///
/// Documents are exchanged as their JSON source. Absence and empty results
/// are not errors.
pub trait SearchBackend: Send + Sync + Clone + 'static {
    /// Fetch one document from `index` by id.
    ///
    /// # Returns
    /// - `Ok(Some(source))` - Document found
    /// - `Ok(None)` - No such document
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or answers with a failure.
    fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>>> + Send;

    /// Run a filtered search in `index`, returning hit sources in order.
    ///
    /// # Errors
    /// Returns `Err` if the store is unreachable or answers with a failure.
    fn search(
        &self,
        index: &str,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>>> + Send;

    /// Health check - verify the store is accessible.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}
