//! Elasticsearch search backend over its REST API.

use super::{SearchBackend, SearchQuery};
use crate::error::{Error, Result};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Configuration for the Elasticsearch backend.
#[derive(Clone, Debug)]
pub struct ElasticsearchConfig {
    pub host: String,
    pub port: u16,
    /// Per-request bound enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        ElasticsearchConfig {
            host: "127.0.0.1".to_string(),
            port: 9200,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ElasticsearchConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct ClusterHealth {
    status: String,
}

/// Elasticsearch backend sharing one pooled HTTP client.
///
/// # Example
///
/// ```no_run
/// # use catalog_cache::search::{ElasticsearchBackend, ElasticsearchConfig, SearchBackend};
/// # async fn example() -> catalog_cache::Result<()> {
/// let search = ElasticsearchBackend::new(ElasticsearchConfig::default())?;
/// let doc = search.get_document("movies", "f1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ElasticsearchBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl ElasticsearchBackend {
    /// Create a backend for the configured node.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the URL or HTTP client is invalid.
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| Error::ConfigError(format!("Invalid Elasticsearch URL: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!("✓ Elasticsearch backend initialized: {}", base_url);

        Ok(ElasticsearchBackend { client, base_url })
    }

    /// Build `<base>/<segment>/<segment>...`, escaping every segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigError(format!("Cannot-be-a-base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn failure(response: reqwest::Response, operation: &str) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Error::SearchError(format!("{} returned {}: {}", operation, status, body))
    }
}

fn parse_get_response(body: Value) -> Result<Option<Value>> {
    let parsed: GetResponse = serde_json::from_value(body)
        .map_err(|e| Error::DeserializationError(format!("Malformed get response: {}", e)))?;
    Ok(if parsed.found { parsed.source } else { None })
}

fn parse_search_response(body: Value) -> Result<Vec<Value>> {
    let parsed: SearchResponse = serde_json::from_value(body)
        .map_err(|e| Error::DeserializationError(format!("Malformed search response: {}", e)))?;
    Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
}

impl SearchBackend for ElasticsearchBackend {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        let url = self.url(&[index, "_doc", id])?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("✓ Elasticsearch GET {}/{} -> ABSENT", index, id);
                Ok(None)
            }
            status if status.is_success() => {
                let body: Value = response.json().await?;
                let source = parse_get_response(body)?;
                debug!(
                    "✓ Elasticsearch GET {}/{} -> {}",
                    index,
                    id,
                    if source.is_some() { "FOUND" } else { "ABSENT" }
                );
                Ok(source)
            }
            _ => Err(Self::failure(response, "Elasticsearch GET").await),
        }
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> Result<Vec<Value>> {
        let url = self.url(&[index, "_search"])?;
        let response = self
            .client
            .post(url)
            .json(&query.to_request_body())
            .send()
            .await?;

        match response.status() {
            // Missing index: nothing to match
            StatusCode::NOT_FOUND => {
                warn!("Elasticsearch index {} not found", index);
                Ok(Vec::new())
            }
            status if status.is_success() => {
                let body: Value = response.json().await?;
                let hits = parse_search_response(body)?;
                debug!(
                    "✓ Elasticsearch SEARCH {} (size {}, from {}) -> {} hits",
                    index,
                    query.size,
                    query.from,
                    hits.len()
                );
                Ok(hits)
            }
            _ => Err(Self::failure(response, "Elasticsearch SEARCH").await),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.url(&["_cluster", "health"])?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, "Elasticsearch health").await);
        }

        let health: ClusterHealth = response.json().await?;
        Ok(health.status != "red")
    }
}
