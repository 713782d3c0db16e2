//! Document store access.
//!
//! All persistent state lives in a JSON tree addressed by `/`-separated
//! paths (`carts/{userKey}/{itemId}`, `orders/{orderNumber}`, ...). Two
//! backends implement the same operations:
//!
//! - [`FirebaseClient`] talks to the Firebase Realtime Database REST API.
//! - [`MemoryStore`] keeps the tree in process, for tests and local runs.
//!
//! # Concurrency
//!
//! Plain `set`/`update` calls are last-writer-wins. [`Database::increment`]
//! is the only read-modify-write primitive and is atomic on both backends.

mod firebase;
mod memory;

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::StoreConfig;

pub use firebase::FirebaseClient;
pub use memory::MemoryStore;

/// Characters the Realtime Database forbids in keys.
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path segment is empty or contains a forbidden character.
    #[error("invalid store path: {0}")]
    InvalidPath(String),

    /// Partial updates must be JSON objects.
    #[error("update value for {0} is not an object")]
    NotAnObject(String),

    /// The value at a counter path is not an integer.
    #[error("value at {0} is not an integer")]
    NotACounter(String),

    /// Too many concurrent writers on the same counter.
    #[error("gave up incrementing {path} after {attempts} attempts")]
    Contention { path: String, attempts: u32 },

    /// The store URL could not be built.
    #[error("invalid store URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A validated `/`-separated location in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath(String);

impl StorePath {
    /// Build a path from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if there are no segments, or if a
    /// segment is empty, contains `/`, or contains one of `. # $ [ ]`.
    pub fn new<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<Self, StoreError> {
        let mut path = String::new();
        for segment in segments {
            validate_segment(segment)?;
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);
        }

        if path.is_empty() {
            return Err(StoreError::InvalidPath("empty path".to_owned()));
        }
        Ok(Self(path))
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if the segment is not a valid key.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment)?;
        Ok(Self(format!("{}/{segment}", self.0)))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty segment".to_owned()));
    }
    if segment.contains('/') || segment.contains(FORBIDDEN_KEY_CHARS) {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains a forbidden character"
        )));
    }
    if segment.chars().any(char::is_control) {
        return Err(StoreError::InvalidPath(format!(
            "segment {segment:?} contains a control character"
        )));
    }
    Ok(())
}

/// Handle to the configured document store.
///
/// Cheap to clone; both backends share their state behind an `Arc`.
#[derive(Clone)]
pub enum Database {
    Firebase(FirebaseClient),
    Memory(MemoryStore),
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firebase(_) => f.write_str("Database::Firebase"),
            Self::Memory(_) => f.write_str("Database::Memory"),
        }
    }
}

impl Database {
    /// Open the backend selected in configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Url`] if the Firebase URL cannot be parsed.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        match config {
            StoreConfig::Firebase {
                database_url,
                auth_token,
            } => Ok(Self::Firebase(FirebaseClient::new(
                database_url,
                auth_token.clone(),
            )?)),
            StoreConfig::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }

    /// A fresh in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Read the value at `path`. Absent and `null` values are `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend request fails.
    pub async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        match self {
            Self::Firebase(client) => client.get(path).await,
            Self::Memory(store) => Ok(store.get(path).await),
        }
    }

    /// Replace the value at `path`. Writing `null` removes it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend request fails.
    pub async fn set(&self, path: &StorePath, value: &Value) -> Result<(), StoreError> {
        match self {
            Self::Firebase(client) => client.set(path, value).await,
            Self::Memory(store) => {
                store.set(path, value.clone()).await;
                Ok(())
            }
        }
    }

    /// Merge the children of `fields` into the object at `path`.
    ///
    /// Children set to `null` are removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotAnObject`] if `fields` is not a JSON object.
    pub async fn update(&self, path: &StorePath, fields: &Value) -> Result<(), StoreError> {
        let Value::Object(map) = fields else {
            return Err(StoreError::NotAnObject(path.to_string()));
        };
        for key in map.keys() {
            validate_segment(key)?;
        }

        match self {
            Self::Firebase(client) => client.update(path, fields).await,
            Self::Memory(store) => {
                store.update(path, map.clone()).await;
                Ok(())
            }
        }
    }

    /// Delete the value at `path`. Deleting an absent value succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend request fails.
    pub async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        match self {
            Self::Firebase(client) => client.remove(path).await,
            Self::Memory(store) => {
                store.remove(path).await;
                Ok(())
            }
        }
    }

    /// Append `value` under `path` with a generated, time-ordered key.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend request fails.
    pub async fn push(&self, path: &StorePath, value: &Value) -> Result<String, StoreError> {
        match self {
            Self::Firebase(client) => client.push(path, value).await,
            Self::Memory(store) => Ok(store.push(path, value.clone()).await),
        }
    }

    /// Atomically add `delta` to the integer at `path` and return the new
    /// value. An absent counter starts from zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotACounter`] if the stored value is not an
    /// integer, or [`StoreError::Contention`] if Firebase keeps rejecting
    /// the conditional write.
    pub async fn increment(&self, path: &StorePath, delta: i64) -> Result<i64, StoreError> {
        match self {
            Self::Firebase(client) => client.increment(path, delta).await,
            Self::Memory(store) => store.increment(path, delta).await,
        }
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend request fails.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Firebase(client) => client.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Read and decode the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if the stored value does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &StorePath,
    ) -> Result<Option<T>, StoreError> {
        self.get(path)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Encode `value` and store it at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if `value` cannot be encoded.
    pub async fn set_json<T: Serialize + Sync>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.set(path, &value).await
    }

    /// Encode `value` and push it under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if `value` cannot be encoded.
    pub async fn push_json<T: Serialize + Sync>(
        &self,
        path: &StorePath,
        value: &T,
    ) -> Result<String, StoreError> {
        let value = serde_json::to_value(value)?;
        self.push(path, &value).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(s: &str) -> StorePath {
        StorePath::new(s.split('/')).unwrap()
    }

    #[test]
    fn test_path_validation() {
        assert_eq!(path("carts/test01_gmail_com").as_str(), "carts/test01_gmail_com");
        assert!(StorePath::new(["orders", ""]).is_err());
        assert!(StorePath::new(["users", "a.b"]).is_err());
        assert!(StorePath::new(["users", "a#b"]).is_err());
        assert!(StorePath::new(["users", "$key"]).is_err());
        assert!(StorePath::new(["users", "a[0]"]).is_err());
        assert!(StorePath::new(["users", "a/b"]).is_err());
        assert!(StorePath::new(std::iter::empty()).is_err());
        assert!(path("orders").child("250601-0001").is_ok());
        assert!(path("orders").child("../users").is_err());
    }

    #[tokio::test]
    async fn test_typed_roundtrip() {
        #[derive(Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
        struct Note {
            text: String,
        }

        let db = Database::memory();
        let p = path("notes/first");
        db.set_json(&p, &Note { text: "hi".to_owned() }).await.unwrap();

        let note: Option<Note> = db.get_json(&p).await.unwrap();
        assert_eq!(note, Some(Note { text: "hi".to_owned() }));

        let missing: Option<Note> = db.get_json(&path("notes/second")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_requires_object() {
        let db = Database::memory();
        let err = db.update(&path("users/x"), &json!(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject(_)));

        let err = db
            .update(&path("users/x"), &json!({ "bad.key": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }
}
