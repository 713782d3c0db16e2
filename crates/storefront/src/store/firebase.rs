//! Firebase Realtime Database REST client.
//!
//! Every location is reachable as `{database_url}/{path}.json`:
//!
//! | Operation   | Request                                              |
//! |-------------|------------------------------------------------------|
//! | `get`       | `GET`, `null` body means absent                      |
//! | `set`       | `PUT`                                                |
//! | `update`    | `PATCH`                                              |
//! | `remove`    | `DELETE`                                             |
//! | `push`      | `POST`, answers `{"name": "<generated key>"}`        |
//! | `increment` | `GET` with ETag, then conditional `PUT` (`if-match`) |
//!
//! See: https://firebase.google.com/docs/database/rest/save-data

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ETAG, IF_MATCH};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{StoreError, StorePath};

/// Conditional writes attempted before giving up on a contended counter.
const MAX_INCREMENT_ATTEMPTS: u32 = 10;

/// Request header asking Firebase to return the value's ETag.
const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// Client for one Firebase Realtime Database.
#[derive(Clone)]
pub struct FirebaseClient {
    inner: Arc<FirebaseClientInner>,
}

struct FirebaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<SecretString>,
}

impl fmt::Debug for FirebaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("auth_token", &self.inner.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseClient {
    /// Create a client for the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Url`] if the URL is invalid, or
    /// [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn new(database_url: &str, auth_token: Option<SecretString>) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(database_url)?;
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }
        base_url.set_query(None);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(FirebaseClientInner {
                client,
                base_url,
                auth_token,
            }),
        })
    }

    /// REST endpoint for `path` (empty for the root).
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.inner.base_url.clone();
        let full_path = format!("{}{path}.json", self.inner.base_url.path());
        url.set_path(&full_path);

        if self.inner.auth_token.is_some() || !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = &self.inner.auth_token {
                pairs.append_pair("auth", token.expose_secret());
            }
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(path.as_str(), &[]))
            .send()
            .await?;
        let value: Value = check(response, path.as_str()).await?.json().await?;
        Ok((!value.is_null()).then_some(value))
    }

    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn set(&self, path: &StorePath, value: &Value) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .put(self.endpoint(path.as_str(), &[("print", "silent")]))
            .json(value)
            .send()
            .await?;
        check(response, path.as_str()).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn update(&self, path: &StorePath, fields: &Value) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .patch(self.endpoint(path.as_str(), &[("print", "silent")]))
            .json(fields)
            .send()
            .await?;
        check(response, path.as_str()).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .delete(self.endpoint(path.as_str(), &[("print", "silent")]))
            .send()
            .await?;
        check(response, path.as_str()).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn push(&self, path: &StorePath, value: &Value) -> Result<String, StoreError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(path.as_str(), &[]))
            .json(value)
            .send()
            .await?;
        let pushed: PushResponse = check(response, path.as_str()).await?.json().await?;
        Ok(pushed.name)
    }

    /// Optimistic read-modify-write using ETags.
    #[instrument(skip_all, fields(path = %path))]
    pub(super) async fn increment(&self, path: &StorePath, delta: i64) -> Result<i64, StoreError> {
        let url = self.endpoint(path.as_str(), &[]);

        for attempt in 1..=MAX_INCREMENT_ATTEMPTS {
            let response = self
                .inner
                .client
                .get(url.clone())
                .header(ETAG_REQUEST_HEADER, "true")
                .send()
                .await?;
            let response = check(response, path.as_str()).await?;

            let etag = response
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
                .ok_or_else(|| StoreError::Api {
                    status: response.status().as_u16(),
                    message: "response carried no ETag".to_owned(),
                })?;

            let current = match response.json::<Value>().await? {
                Value::Null => 0,
                value => value
                    .as_i64()
                    .ok_or_else(|| StoreError::NotACounter(path.to_string()))?,
            };
            let next = current + delta;

            let response = self
                .inner
                .client
                .put(url.clone())
                .header(IF_MATCH, etag.as_str())
                .json(&next)
                .send()
                .await?;

            if response.status() == StatusCode::PRECONDITION_FAILED {
                debug!(attempt, "Counter changed underneath us, retrying");
                continue;
            }
            check(response, path.as_str()).await?;
            return Ok(next);
        }

        Err(StoreError::Contention {
            path: path.to_string(),
            attempts: MAX_INCREMENT_ATTEMPTS,
        })
    }

    /// Shallow read of the root, enough to prove credentials work.
    pub(super) async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("", &[("shallow", "true")]))
            .send()
            .await?;
        check(response, "/").await?;
        Ok(())
    }
}

/// Turn non-success responses into [`StoreError::Api`].
async fn check(response: reqwest::Response, path: &str) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        status = %status,
        path,
        body = %body.chars().take(500).collect::<String>(),
        "Firebase returned non-success status"
    );

    // Firebase errors look like {"error": "Permission denied"}
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.chars().take(200).collect());

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}
