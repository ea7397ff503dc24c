//! Query parameters for list lookups and their canonical encoding.
//!
//! A [`QueryParams`] is an unordered mapping from parameter name to value.
//! It is backed by a `BTreeMap`, so two parameter sets that are equal as
//! mappings iterate, compare and serialize identically no matter in which
//! order they were built. [`QueryParams::canonical`] is the documented cache
//! key contract: compact JSON with keys in ascending byte order.
//!
//! ```
//! use catalog_cache::params::QueryParams;
//!
//! let a = QueryParams::new().with("limit", 10).with("genres", vec!["sci-fi"]);
//! let b = QueryParams::new().with("genres", vec!["sci-fi"]).with("limit", 10);
//!
//! assert_eq!(a, b);
//! assert_eq!(a.canonical().unwrap(), r#"{"genres":["sci-fi"],"limit":10}"#);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Page size used when neither `limit` nor `size` is given.
pub const DEFAULT_LIMIT: usize = 10;

/// Name aliases accepted for the page size, in lookup order.
const LIMIT_NAMES: [&str; 2] = ["limit", "size"];

/// Name aliases accepted for the page start, in lookup order.
const OFFSET_NAMES: [&str; 2] = ["offset", "from"];

/// A single scalar parameter value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A parameter value: a scalar or an ordered list of scalars.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl ParamValue {
    /// All scalars carried by this value, in order.
    pub fn scalars(&self) -> &[Scalar] {
        match self {
            ParamValue::Scalar(s) => std::slice::from_ref(s),
            ParamValue::List(items) => items,
        }
    }

    fn as_non_negative(&self, name: &str) -> Result<usize> {
        let parsed = match self {
            ParamValue::Scalar(Scalar::Int(n)) => usize::try_from(*n).ok(),
            ParamValue::Scalar(Scalar::Str(s)) => s.trim().parse::<usize>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| {
            Error::ValidationError(format!(
                "parameter '{}' must be a non-negative integer, got {:?}",
                name, self
            ))
        })
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Scalar(Scalar::Int(v))
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Scalar(Scalar::Int(i64::from(v)))
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Scalar(Scalar::Int(i64::from(v)))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Scalar(Scalar::Str(v))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::List(v.into_iter().map(Scalar::Str).collect())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(v: Vec<&str>) -> Self {
        ParamValue::List(v.into_iter().map(|s| Scalar::Str(s.to_string())).collect())
    }
}

/// Unordered parameter-name → value mapping for list lookups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        QueryParams(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a parameter, returning the previous value if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in canonical (ascending name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical, order-independent encoding: compact JSON, sorted keys.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if encoding fails.
    pub fn canonical(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Page size: `limit`, else `size`, else [`DEFAULT_LIMIT`].
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for negative or non-integer values.
    pub fn limit(&self) -> Result<usize> {
        self.first_non_negative(&LIMIT_NAMES, DEFAULT_LIMIT)
    }

    /// Page start: `offset`, else `from`, else 0.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for negative or non-integer values.
    pub fn offset(&self) -> Result<usize> {
        self.first_non_negative(&OFFSET_NAMES, 0)
    }

    /// String values of a scalar-or-list parameter. Empty when absent.
    pub fn filter_values(&self, name: &str) -> Vec<String> {
        self.0
            .get(name)
            .map(|v| v.scalars().iter().map(Scalar::to_string).collect())
            .unwrap_or_default()
    }

    fn first_non_negative(&self, names: &[&str], default: usize) -> Result<usize> {
        for name in names {
            if let Some(value) = self.0.get(*name) {
                return value.as_non_negative(name);
            }
        }
        Ok(default)
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryParams(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
