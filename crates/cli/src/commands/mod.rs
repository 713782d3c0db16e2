//! CLI command implementations.

pub mod orders;
pub mod users;

use chrono::FixedOffset;
use thiserror::Error;

use sml_market_storefront::config::{ConfigError, StoreConfig, utc_offset_from_env};
use sml_market_storefront::db::{OrderRepository, RepositoryError, UserRepository};
use sml_market_storefront::store::{Database, StoreError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Store settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store client could not be created.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// No record under the given key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Store handle and the shop's UTC offset.
pub struct Store {
    db: Database,
    utc_offset: FixedOffset,
}

impl Store {
    /// Connect using the storefront's store variables.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Config` for missing or invalid variables.
    pub fn from_env() -> Result<Self, CommandError> {
        dotenvy::dotenv().ok();

        let config = StoreConfig::from_env()?;
        let utc_offset = utc_offset_from_env()?;
        tracing::debug!(store = ?config, "Connecting to store");

        Ok(Self {
            db: Database::connect(&config)?,
            utc_offset,
        })
    }

    #[cfg(test)]
    pub fn memory() -> Self {
        use chrono::Offset;

        Self {
            db: Database::memory(),
            utc_offset: FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| chrono::Utc.fix()),
        }
    }

    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.db, self.utc_offset)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.db)
    }
}
