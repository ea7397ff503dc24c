//! Cache key construction.
//!
//! Two key shapes share one key space:
//!
//! - single entity: the entity id itself (`"f1"`)
//! - list query: `"<index>:<canonical params>"`
//!   (`movies:{"genres":["sci-fi"],"limit":10,"offset":0}`)
//!
//! Ids assigned by the search backend never start with `<index>:{`, so the
//! two shapes cannot collide for catalog data.

use crate::entity::CatalogEntity;
use crate::error::Result;
use crate::params::QueryParams;

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Key for a single-entity lookup.
    pub fn entity(id: &str) -> String {
        id.to_string()
    }

    /// Key for a list lookup of `T` with the given parameters.
    ///
    /// Equal parameter mappings always produce the same key.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the parameters cannot be encoded.
    pub fn list<T: CatalogEntity>(params: &QueryParams) -> Result<String> {
        Self::list_with_prefix(T::index_name(), params)
    }

    /// Key for a list lookup under an explicit index name.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the parameters cannot be encoded.
    pub fn list_with_prefix(index: &str, params: &QueryParams) -> Result<String> {
        Ok(format!("{}:{}", index, params.canonical()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Film, Genre};

    #[test]
    fn test_entity_key_is_id() {
        assert_eq!(CacheKeyBuilder::entity("f1"), "f1");
    }

    #[test]
    fn test_list_key_format() {
        let params = QueryParams::new()
            .with("genres", vec!["sci-fi"])
            .with("limit", 10)
            .with("offset", 0);

        let key = CacheKeyBuilder::list::<Film>(&params).unwrap();
        assert_eq!(key, r#"movies:{"genres":["sci-fi"],"limit":10,"offset":0}"#);
    }

    #[test]
    fn test_list_key_is_namespaced_per_index() {
        let params = QueryParams::new().with("size", 10).with("from", 0);

        let genres = CacheKeyBuilder::list::<Genre>(&params).unwrap();
        let films = CacheKeyBuilder::list::<Film>(&params).unwrap();
        assert_ne!(genres, films);
        assert!(genres.starts_with("genres:"));
    }
}
