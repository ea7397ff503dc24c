//! Core entity trait that every cataloged record implements.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A list-query parameter that narrows results by exact match on a
/// document field.
///
/// Each supplied value becomes one term clause; clauses are combined with
/// AND semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListFilter {
    /// Name of the query parameter (e.g. `genres`).
    pub param: &'static str,
    /// Document field the values are matched against (e.g. `genre`).
    pub field: &'static str,
}

/// Trait that all catalog entities must implement.
///
/// The cache mirrors exactly what the search store returned, so an entity
/// read back from either store for the same `id` is the same value.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use catalog_cache::CatalogEntity;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Studio {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl CatalogEntity for Studio {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn index_name() -> &'static str {
///         "studios"
///     }
/// }
/// ```
pub trait CatalogEntity: Send + Sync + Serialize + DeserializeOwned + Clone + 'static {
    /// Opaque identifier assigned by the search backend.
    fn id(&self) -> &str;

    /// Search index holding this entity type. Also namespaces list cache keys.
    fn index_name() -> &'static str;

    /// Filters supported by list queries. Default: pagination only.
    fn list_filters() -> &'static [ListFilter] {
        &[]
    }

    /// Serialize entity for cache storage (compact JSON).
    ///
    /// See `crate::serialization` for the format.
    fn serialize_for_cache(&self) -> Result<Vec<u8>> {
        crate::serialization::encode_entity(self)
    }

    /// Deserialize entity from cache storage.
    ///
    /// # Errors
    /// - `Error::DeserializationError`: bytes do not match the schema
    fn deserialize_from_cache(bytes: &[u8]) -> Result<Self> {
        crate::serialization::decode_entity(bytes)
    }

    /// Build the entity from a search document's source.
    ///
    /// # Errors
    /// - `Error::DeserializationError`: document does not match the schema
    fn from_document(document: serde_json::Value) -> Result<Self> {
        serde_json::from_value(document).map_err(|e| {
            Error::DeserializationError(format!(
                "{} document does not match schema: {}",
                Self::index_name(),
                e
            ))
        })
    }

    /// Validate the entity after it was loaded from either store.
    fn validate(&self) -> Result<()> {
        if self.id().is_empty() {
            return Err(Error::DeserializationError(format!(
                "{} entity has an empty id",
                Self::index_name()
            )));
        }
        Ok(())
    }
}
