//! Product search client.
//!
//! Products are not stored locally; every lookup goes to the remote
//! vector-search API (`POST {base}/v1/search-by-vector`). Pages are cached
//! with `moka` for 5 minutes, keyed by query, limit and offset.

mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

pub use types::{Product, SearchPage};
use types::{SearchEnvelope, SearchRequest};

/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page the API is asked for.
pub const MAX_LIMIT: u32 = 100;

/// Errors that can occur when querying the search API.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("search API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered `success: false`.
    #[error("search rejected: {0}")]
    Rejected(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    query: String,
    limit: u32,
    offset: u32,
}

/// Client for the product search API.
#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<SearchClientInner>,
}

struct SearchClientInner {
    client: reqwest::Client,
    endpoint: String,
    cache: Cache<CacheKey, SearchPage>,
}

impl SearchClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, SearchError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(SearchClientInner {
                client,
                endpoint: format!("{}/v1/search-by-vector", base_url.trim_end_matches('/')),
                cache,
            }),
        })
    }

    /// Search products.
    ///
    /// `limit` defaults to 20 and is capped at 100; `offset` defaults to 0.
    /// A blank query returns an empty page without calling the API.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the request fails or the API rejects it.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<SearchPage, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchPage::default());
        }

        let key = CacheKey {
            query: query.to_owned(),
            limit: clamp_limit(limit),
            offset: offset.unwrap_or(0),
        };

        if let Some(page) = self.inner.cache.get(&key).await {
            debug!("Cache hit for search");
            return Ok(page);
        }

        let page = self.fetch(&key).await?;
        self.inner.cache.insert(key, page.clone()).await;
        Ok(page)
    }

    /// Look up a single product by its exact code.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the search request fails.
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Product>, SearchError> {
        let page = self.search(code, Some(DEFAULT_LIMIT), Some(0)).await?;
        Ok(page.products.into_iter().find(|p| p.code == code))
    }

    async fn fetch(&self, key: &CacheKey) -> Result<SearchPage, SearchError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&SearchRequest {
                query: &key.query,
                limit: key.limit,
                offset: key.offset,
            })
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Search API returned non-success status"
            );
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let envelope: SearchEnvelope = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse search response"
                );
                return Err(SearchError::Parse(e));
            }
        };

        if !envelope.success {
            return Err(SearchError::Rejected(envelope.message));
        }

        let page = envelope.data.map(SearchPage::from).unwrap_or_default();
        debug!(results = page.products.len(), total = page.total_count, "Search completed");
        Ok(page)
    }
}

/// Apply the default page size and the upper bound.
fn clamp_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_LIMIT,
        Some(limit) => limit.min(MAX_LIMIT),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 20);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(500)), 100);
    }

    /// Serve a fake search API and return its base URL and hit counter.
    async fn fake_api(status: StatusCode, body: Value) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1/search-by-vector",
                post(
                    |State((hits, status, body)): State<(Arc<AtomicUsize>, StatusCode, Value)>,
                     Json(request): Json<Value>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        assert!(request.get("query").is_some());
                        (status, Json(body))
                    },
                ),
            )
            .with_state((hits.clone(), status, body));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn results() -> Value {
        json!({
            "success": true,
            "data": {
                "data": [
                    { "id": "1", "code": "BRK-001X", "name": "Brake pad XL", "price": 450 },
                    { "id": "2", "code": "BRK-001", "name": "Brake pad", "price": 390.5 }
                ],
                "total_count": 2,
                "query": "BRK-001",
                "duration": 12.5
            },
            "message": "ok"
        })
    }

    #[tokio::test]
    async fn test_search_is_cached() {
        let (url, hits) = fake_api(StatusCode::OK, results()).await;
        let client = SearchClient::new(&url).unwrap();

        let page = client.search("BRK-001", None, None).await.unwrap();
        assert_eq!(page.products.len(), 2);
        assert_eq!(page.total_count, 2);

        client.search("BRK-001", None, None).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.search("BRK-001", Some(10), None).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_query_skips_api() {
        let (url, hits) = fake_api(StatusCode::OK, results()).await;
        let client = SearchClient::new(&url).unwrap();

        let page = client.search("   ", None, None).await.unwrap();
        assert!(page.products.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_find_by_code_is_exact() {
        let (url, _) = fake_api(StatusCode::OK, results()).await;
        let client = SearchClient::new(&url).unwrap();

        let product = client.find_by_code("BRK-001").await.unwrap().unwrap();
        assert_eq!(product.name, "Brake pad");
        assert!(client.find_by_code("BRK").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_errors() {
        let (url, _) = fake_api(StatusCode::INTERNAL_SERVER_ERROR, json!({})).await;
        let client = SearchClient::new(&url).unwrap();
        assert!(matches!(
            client.search("x", None, None).await,
            Err(SearchError::Api { status: 500, .. })
        ));

        let (url, _) = fake_api(
            StatusCode::OK,
            json!({ "success": false, "data": null, "message": "index offline" }),
        )
        .await;
        let client = SearchClient::new(&url).unwrap();
        match client.search("x", None, None).await {
            Err(SearchError::Rejected(message)) => assert_eq!(message, "index offline"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
