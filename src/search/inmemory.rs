//! In-memory search backend for tests, benches and local runs.
//!
//! Each index is an ordered list of documents; search preserves insertion
//! order, which stands in for relevance order.

use super::{SearchBackend, SearchQuery};
use crate::entity::CatalogEntity;
use crate::error::{Error, Result};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Thread-safe in-memory document store.
///
/// Clones share the same documents and call counters.
///
/// # Example
///
/// ```
/// use catalog_cache::models::Film;
/// use catalog_cache::search::InMemorySearchBackend;
///
/// let search = InMemorySearchBackend::new();
/// search.insert_entity(&Film::new("f1", "Dune")).unwrap();
/// assert_eq!(search.document_count("movies"), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemorySearchBackend {
    indices: Arc<DashMap<String, Vec<Value>>>,
    get_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw document source to `index`.
    pub fn insert_document(&self, index: &str, document: Value) {
        self.indices
            .entry(index.to_string())
            .or_default()
            .push(document);
    }

    /// Append an entity to its own index.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the entity cannot be encoded.
    pub fn insert_entity<T: CatalogEntity>(&self, entity: &T) -> Result<()> {
        let document =
            serde_json::to_value(entity).map_err(|e| Error::SerializationError(e.to_string()))?;
        self.insert_document(T::index_name(), document);
        Ok(())
    }

    /// Replace the document with the same `id`, or append it.
    pub fn upsert_document(&self, index: &str, document: Value) {
        let mut docs = self.indices.entry(index.to_string()).or_default();
        let id = document.get("id").cloned();
        let position = docs
            .iter()
            .position(|doc| id.is_some() && doc.get("id") == id.as_ref());
        match position {
            Some(i) => docs[i] = document,
            None => docs.push(document),
        }
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.indices.get(index).map(|docs| docs.len()).unwrap_or(0)
    }

    /// Number of `get_document` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `search` calls served so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Simulate an outage: every call fails with `Error::SearchError`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::SearchError(
                "in-memory search backend marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl SearchBackend for InMemorySearchBackend {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let found = self.indices.get(index).and_then(|docs| {
            docs.iter()
                .find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
        });

        debug!(
            "✓ InMemory search GET {}/{} -> {}",
            index,
            id,
            if found.is_some() { "FOUND" } else { "ABSENT" }
        );
        Ok(found)
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let hits: Vec<Value> = self
            .indices
            .get(index)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.matches(doc))
                    .skip(query.from)
                    .take(query.size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "✓ InMemory search {} ({} clauses, size {}, from {}) -> {} hits",
            index,
            query.filters.len(),
            query.size,
            query.from,
            hits.len()
        );
        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Film;
    use serde_json::json;

    fn catalog() -> InMemorySearchBackend {
        let search = InMemorySearchBackend::new();
        search
            .insert_entity(&Film::new("f1", "Dune").with_genres(["sci-fi", "drama"]))
            .unwrap();
        search
            .insert_entity(&Film::new("f2", "Alien").with_genres(["sci-fi", "horror"]))
            .unwrap();
        search
            .insert_entity(&Film::new("f3", "Heat").with_genres(["crime", "drama"]))
            .unwrap();
        search
    }

    #[tokio::test]
    async fn test_get_document() {
        let search = catalog();

        let doc = search.get_document("movies", "f2").await.unwrap();
        assert_eq!(doc.unwrap()["title"], "Alien");

        assert!(search.get_document("movies", "zzz").await.unwrap().is_none());
        assert!(search.get_document("nope", "f1").await.unwrap().is_none());
        assert_eq!(search.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_search_filters_and_paginates_in_order() {
        let search = catalog();

        let all = search.search("movies", &SearchQuery::new(10, 0)).await.unwrap();
        let ids: Vec<&str> = all.iter().filter_map(|d| d["id"].as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2", "f3"]);

        let page = search.search("movies", &SearchQuery::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], "f2");

        let both = SearchQuery::new(10, 0)
            .with_term("genre", "sci-fi")
            .with_term("genre", "drama");
        let hits = search.search("movies", &both).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], "f1");

        assert_eq!(search.search_calls(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails() {
        let search = catalog();
        search.set_unavailable(true);

        assert!(matches!(
            search.get_document("movies", "f1").await,
            Err(Error::SearchError(_))
        ));
        assert!(!search.health_check().await.unwrap());

        search.set_unavailable(false);
        assert!(search.get_document("movies", "f1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let search = catalog();
        search.upsert_document("movies", json!({"id": "f1", "title": "Dune: Part One"}));

        assert_eq!(search.document_count("movies"), 3);
        let doc = search.get_document("movies", "f1").await.unwrap().unwrap();
        assert_eq!(doc["title"], "Dune: Part One");
    }
}
