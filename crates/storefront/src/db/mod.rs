//! Repositories over the document store.
//!
//! # Layout
//!
//! - `carts/{userKey}/{itemId}` - cart line items, keyed by push id
//! - `orders/{orderNumber}` - placed orders (never deleted)
//! - `users/{userKey}` - customer profile and order aggregates
//! - `counters/orderNumber/{dateKey}` - per-day order sequence
//!
//! Repositories borrow a [`Database`] and are cheap to construct per call.

pub mod carts;
pub mod orders;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sml_market_core::{CartItemError, OrderError};
use thiserror::Error;

use crate::store::{StoreError, StorePath};

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store request failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Cart input rejected.
    #[error(transparent)]
    CartItem(#[from] CartItemError),

    /// Order rule violated.
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Decode every child of the object at `path`, keyed by its store key.
///
/// An absent location is an empty list.
async fn children<T: DeserializeOwned>(
    db: &crate::store::Database,
    path: &StorePath,
) -> Result<Vec<(String, T)>, RepositoryError> {
    let Some(value) = db.get(path).await? else {
        return Ok(Vec::new());
    };
    let Value::Object(map) = value else {
        return Err(RepositoryError::DataCorruption(format!(
            "expected an object at {path}"
        )));
    };

    map.into_iter()
        .map(|(key, child)| {
            serde_json::from_value(child)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|e| RepositoryError::DataCorruption(format!("{path}/{key}: {e}")))
        })
        .collect()
}

/// Decode a single record, reporting failures as corruption.
async fn record<T: DeserializeOwned>(
    db: &crate::store::Database,
    path: &StorePath,
) -> Result<Option<T>, RepositoryError> {
    match db.get_json(path).await {
        Ok(value) => Ok(value),
        Err(StoreError::Json(e)) => Err(RepositoryError::DataCorruption(format!("{path}: {e}"))),
        Err(e) => Err(e.into()),
    }
}
