//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::StorefrontConfig;
use crate::db::{CartRepository, OrderRepository, UserRepository};
use crate::search::{SearchClient, SearchError};
use crate::store::{Database, StoreError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("search client: {0}")]
    Search(#[from] SearchError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the document store, the search client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    db: Database,
    search: SearchClient,
}

impl AppState {
    /// Create a new application state, connecting to the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store URL is invalid or an HTTP client
    /// cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let db = Database::connect(&config.store)?;
        Self::with_database(config, db)
    }

    /// Create a state around an existing store handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the search HTTP client cannot be built.
    pub fn with_database(config: StorefrontConfig, db: Database) -> Result<Self, StateError> {
        let search = SearchClient::new(&config.search_api_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, db, search }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the product search client.
    #[must_use]
    pub fn search(&self) -> &SearchClient {
        &self.inner.search
    }

    /// Cart repository over the shared store.
    #[must_use]
    pub fn carts(&self) -> CartRepository<'_> {
        CartRepository::new(&self.inner.db)
    }

    /// Order repository dating orders in the shop's offset.
    #[must_use]
    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.inner.db, self.inner.config.utc_offset)
    }

    /// User repository over the shared store.
    #[must_use]
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.inner.db)
    }

    /// The shop's calendar date at `now`.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.inner.config.utc_offset).date_naive()
    }
}
