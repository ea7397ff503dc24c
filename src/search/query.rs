//! Filter-query construction for list lookups.
//!
//! For each filter parameter an entity supports (e.g. `genres` on films),
//! every supplied value becomes one exact-match term clause. Clauses are
//! combined with AND ("must") semantics, so a document matches only if it
//! satisfies all of them. Absent filters impose no constraint. Pagination
//! bounds the result window and is never a predicate.

use crate::entity::CatalogEntity;
use crate::error::Result;
use crate::params::QueryParams;
use serde_json::{json, Value};

/// One exact-match predicate on a document field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermClause {
    pub field: String,
    pub value: String,
}

impl TermClause {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        TermClause {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True if the document field equals the value, or, for array fields,
    /// contains it.
    pub fn matches(&self, document: &Value) -> bool {
        match document.get(&self.field) {
            Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, &self.value)),
            Some(other) => scalar_eq(other, &self.value),
            None => false,
        }
    }
}

fn scalar_eq(field: &Value, expected: &str) -> bool {
    match field {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

/// A conjunctive, paginated search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    /// Term clauses, all of which must match.
    pub filters: Vec<TermClause>,
    /// Maximum number of hits (page size).
    pub size: usize,
    /// Number of hits to skip (page start).
    pub from: usize,
}

impl SearchQuery {
    /// Unfiltered query for one page.
    pub fn new(size: usize, from: usize) -> Self {
        SearchQuery {
            filters: Vec::new(),
            size,
            from,
        }
    }

    /// Add one term clause.
    pub fn with_term(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(TermClause::new(field, value));
        self
    }

    /// Build the query for a list lookup of `T`.
    ///
    /// Only the filters `T` declares are translated; other parameters are
    /// part of the cache key but not of the search.
    ///
    /// # Errors
    /// Returns `Error::ValidationError` for invalid pagination values.
    pub fn for_entity<T: CatalogEntity>(params: &QueryParams) -> Result<Self> {
        let mut query = SearchQuery::new(params.limit()?, params.offset()?);

        for filter in T::list_filters() {
            for value in params.filter_values(filter.param) {
                query = query.with_term(filter.field, value);
            }
        }

        Ok(query)
    }

    /// True if every term clause matches the document.
    pub fn matches(&self, document: &Value) -> bool {
        self.filters.iter().all(|clause| clause.matches(document))
    }

    /// Query DSL: `bool.must` of `term` clauses, or `match_all` when unfiltered.
    pub fn to_query_dsl(&self) -> Value {
        if self.filters.is_empty() {
            return json!({ "match_all": {} });
        }

        let must: Vec<Value> = self
            .filters
            .iter()
            .map(|clause| {
                let mut term = serde_json::Map::new();
                term.insert(clause.field.clone(), Value::String(clause.value.clone()));
                json!({ "term": term })
            })
            .collect();

        json!({ "bool": { "must": must } })
    }

    /// Full `_search` request body including the result window.
    pub fn to_request_body(&self) -> Value {
        json!({
            "query": self.to_query_dsl(),
            "size": self.size,
            "from": self.from,
        })
    }
}
