//! HTTP layer: axum routes over a [`Catalog`].
//!
//! Handlers only parse requests, call the service and map outcomes:
//! `Lookup::NotFound` is 404, invalid parameters are 400, unreachable or
//! slow stores are 503 and anything else is 500. Error bodies are
//! `application/problem+json`.

use crate::backend::CacheBackend;
use crate::entity::CatalogEntity;
use crate::error::Error;
use crate::models::{Film, FilmResponse, Genre, GenreResponse, Person, PersonResponse};
use crate::params::{QueryParams, DEFAULT_LIMIT};
use crate::repository::Lookup;
use crate::search::SearchBackend;
use crate::service::{Catalog, EntityService};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Largest page a list endpoint will serve.
pub const MAX_PAGE_SIZE: usize = 100;

pub const ERROR_CODE_NOT_FOUND: u16 = 1001;
pub const ERROR_CODE_INVALID_PARAMS: u16 = 1002;
pub const ERROR_CODE_STORE_UNAVAILABLE: u16 = 1003;
pub const ERROR_CODE_INTERNAL: u16 = 1004;

/// API HTTP error.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub http_code: StatusCode,
    /// Error body
    pub body: ErrorBody,
}

/// Error body serialized in problem+json responses.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ErrorBody {
    /// Short error title
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Detailed error description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Error code for client handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.body.detail.is_empty() {
            write!(f, "{}: {}", self.body.title, self.body.detail)
        } else {
            write!(f, "{}", self.body.title)
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create new error with HTTP status code
    pub fn new(http_code: StatusCode) -> Self {
        Self {
            http_code,
            body: ErrorBody::default(),
        }
    }

    /// Build Bad Request (400) error
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
            .title("Bad Request")
            .error_code(ERROR_CODE_INVALID_PARAMS)
    }

    /// Build Not Found (404) error
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .title("Not Found")
            .error_code(ERROR_CODE_NOT_FOUND)
    }

    /// Build Service Unavailable (503) error
    pub fn unavailable(cause: impl fmt::Display) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE)
            .title("Service Unavailable")
            .detail(cause.to_string())
            .error_code(ERROR_CODE_STORE_UNAVAILABLE)
    }

    /// Build Internal Server Error (500)
    pub fn internal(cause: impl fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
            .title("Internal Server Error")
            .detail(cause.to_string())
            .error_code(ERROR_CODE_INTERNAL)
    }

    /// Set error title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.body.title = title.into();
        self
    }

    /// Set error detail
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.body.detail = detail.into();
        self
    }

    /// Set error code
    pub fn error_code(mut self, code: u16) -> Self {
        self.body.error_code = Some(code);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.http_code,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self.body),
        )
            .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ValidationError(detail) => ApiError::bad_request().detail(detail),
            err if err.is_unavailable() => {
                warn!("Store unavailable: {}", err);
                ApiError::unavailable(err)
            }
            err => {
                error!("Request failed: {}", err);
                ApiError::internal(err)
            }
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the application router.
///
/// # Example
///
/// ```
/// use catalog_cache::api;
/// use catalog_cache::backend::InMemoryBackend;
/// use catalog_cache::observability::TtlPolicy;
/// use catalog_cache::search::InMemorySearchBackend;
/// use catalog_cache::service::{Catalog, ServiceConfig};
///
/// let catalog = Catalog::new(
///     InMemoryBackend::new(),
///     InMemorySearchBackend::new(),
///     &TtlPolicy::default(),
///     ServiceConfig::default(),
/// );
/// let _app = api::router(catalog);
/// ```
pub fn router<B: CacheBackend, S: SearchBackend>(catalog: Catalog<B, S>) -> Router {
    Router::new()
        .route("/health", get(health::<B, S>))
        .route("/api/v1/films", get(films_list::<B, S>))
        .route("/api/v1/films/{film_id}", get(film_details::<B, S>))
        .route("/api/v1/genres", get(genres_list::<B, S>))
        .route("/api/v1/genres/{genre_id}", get(genre_details::<B, S>))
        .route("/api/v1/persons", get(persons_list::<B, S>))
        .route("/api/v1/persons/{person_id}", get(person_details::<B, S>))
        .with_state(catalog)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
) -> Response {
    let report = catalog.health().await;
    let (status, label) = if report.is_serving() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(json!({
            "status": label,
            "cache": report.cache,
            "search": report.search,
            "version": crate::VERSION,
        })),
    )
        .into_response()
}

async fn film_details<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Path(film_id): Path<String>,
) -> ApiResult<Json<FilmResponse>> {
    fetch_one(&catalog.films, &film_id, "Film").await
}

async fn films_list<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<FilmResponse>>> {
    let params = list_params::<Film>(&query)?;
    fetch_many(&catalog.films, &params, "Films").await
}

async fn genre_details<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Path(genre_id): Path<String>,
) -> ApiResult<Json<GenreResponse>> {
    fetch_one(&catalog.genres, &genre_id, "Genre").await
}

async fn genres_list<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<GenreResponse>>> {
    let params = list_params::<Genre>(&query)?;
    fetch_many(&catalog.genres, &params, "Genres").await
}

async fn person_details<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Path(person_id): Path<String>,
) -> ApiResult<Json<PersonResponse>> {
    fetch_one(&catalog.persons, &person_id, "Person").await
}

async fn persons_list<B: CacheBackend, S: SearchBackend>(
    State(catalog): State<Catalog<B, S>>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<PersonResponse>>> {
    let params = list_params::<Person>(&query)?;
    fetch_many(&catalog.persons, &params, "Persons").await
}

async fn fetch_one<T, R, B, S>(
    service: &EntityService<T, B, S>,
    id: &str,
    label: &str,
) -> ApiResult<Json<R>>
where
    T: CatalogEntity,
    R: From<T>,
    B: CacheBackend,
    S: SearchBackend,
{
    match service.get_by_id(id).await? {
        Lookup::Found(entity) => Ok(Json(R::from(entity))),
        Lookup::NotFound => Err(ApiError::not_found().detail(format!("{} not found", label))),
    }
}

async fn fetch_many<T, R, B, S>(
    service: &EntityService<T, B, S>,
    params: &QueryParams,
    label: &str,
) -> ApiResult<Json<Vec<R>>>
where
    T: CatalogEntity,
    R: From<T>,
    B: CacheBackend,
    S: SearchBackend,
{
    match service.get_by_params(params).await? {
        Lookup::Found(entities) => Ok(Json(entities.into_iter().map(R::from).collect())),
        Lookup::NotFound => Err(ApiError::not_found().detail(format!("{} not found", label))),
    }
}

// ============================================================================
// Query parsing
// ============================================================================

/// Normalize a list request's query string into service parameters.
///
/// Pagination is accepted as `limit`/`size` and `offset`/`from` and always
/// materialized under `limit` and `offset`. Each filter `T` declares may be
/// repeated or comma separated and is kept in the order given. Anything
/// else is ignored.
pub fn list_params<T: CatalogEntity>(query: &[(String, String)]) -> ApiResult<QueryParams> {
    let limit = pagination(query, &["limit", "size"], DEFAULT_LIMIT)?;
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ApiError::bad_request().detail(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let offset = pagination(query, &["offset", "from"], 0)?;

    let mut params = QueryParams::new()
        .with("limit", limit as i64)
        .with("offset", offset as i64);

    for filter in T::list_filters() {
        let values: Vec<String> = query
            .iter()
            .filter(|(name, _)| name == filter.param)
            .flat_map(|(_, value)| value.split(','))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();

        if !values.is_empty() {
            params.insert(filter.param, values);
        }
    }

    Ok(params)
}

/// First matching alias wins; the last occurrence of that alias is used.
fn pagination(query: &[(String, String)], aliases: &[&str], default: usize) -> ApiResult<usize> {
    for alias in aliases {
        if let Some((_, raw)) = query.iter().rev().find(|(name, _)| name == alias) {
            return raw.trim().parse::<usize>().map_err(|_| {
                ApiError::bad_request()
                    .detail(format!("{} must be a non-negative integer, got {:?}", alias, raw))
            });
        }
    }
    Ok(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CacheKeyBuilder;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_materialized() {
        let params = list_params::<Genre>(&[]).unwrap();
        assert_eq!(params.canonical().unwrap(), r#"{"limit":10,"offset":0}"#);
    }

    #[test]
    fn test_aliases_normalize_to_limit_offset() {
        let params = list_params::<Person>(&query(&[("size", "5"), ("from", "20")])).unwrap();
        assert_eq!(
            CacheKeyBuilder::list::<Person>(&params).unwrap(),
            r#"persons:{"limit":5,"offset":20}"#
        );
    }

    #[test]
    fn test_repeated_and_comma_separated_genres() {
        let params = list_params::<Film>(&query(&[
            ("genres", "sci-fi,drama"),
            ("genres", "horror"),
        ]))
        .unwrap();
        assert_eq!(
            params.filter_values("genres"),
            vec!["sci-fi", "drama", "horror"]
        );
    }

    #[test]
    fn test_genres_ignored_for_other_entities() {
        let params = list_params::<Genre>(&query(&[("genres", "drama")])).unwrap();
        assert!(!params.contains("genres"));
    }

    #[test]
    fn test_invalid_pagination() {
        let err = list_params::<Film>(&query(&[("limit", "ten")])).unwrap_err();
        assert_eq!(err.http_code, StatusCode::BAD_REQUEST);

        let err = list_params::<Film>(&query(&[("offset", "-1")])).unwrap_err();
        assert_eq!(err.http_code, StatusCode::BAD_REQUEST);

        let err = list_params::<Film>(&query(&[("limit", "0")])).unwrap_err();
        assert_eq!(err.http_code, StatusCode::BAD_REQUEST);

        let err = list_params::<Film>(&query(&[("limit", "1000")])).unwrap_err();
        assert_eq!(err.http_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (Error::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (Error::BackendError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::SearchError("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::Timeout("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::DeserializationError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Other("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).http_code, status);
        }
    }
}
