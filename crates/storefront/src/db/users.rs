//! User repository.
//!
//! Profiles live at `users/{userKey}`. There are no passwords: a user is
//! created on first login and refreshed on every later one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use sml_market_core::{Email, User, UserStats};

use super::{RepositoryError, children, record};
use crate::store::{Database, StoreError, StorePath};

/// Fields touched when an order is counted against a user.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderAggregates {
    total_orders: u64,
    #[serde(with = "sml_market_core::types::money::as_number")]
    total_spent: Decimal,
    last_login: DateTime<Utc>,
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn user_path(email: &Email) -> Result<StorePath, RepositoryError> {
        Ok(StorePath::new(["users", email.user_key().as_str()])?)
    }

    /// Create the user on first login, otherwise refresh name and login time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the store request fails.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn upsert(
        &self,
        email: &Email,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let path = Self::user_path(email)?;

        match record::<User>(self.db, &path).await? {
            Some(mut user) => {
                self.db
                    .update(&path, &json!({ "displayName": display_name, "lastLogin": now }))
                    .await?;
                display_name.clone_into(&mut user.display_name);
                user.last_login = now;
                Ok(user)
            }
            None => {
                let user = User::new(email.clone(), display_name.to_owned(), now);
                self.db.set_json(&path, &user).await?;
                debug!("Created user");
                Ok(user)
            }
        }
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored record is invalid.
    pub async fn get(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        record(self.db, &Self::user_path(email)?).await
    }

    /// All users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored record is invalid.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = children(self.db, &StorePath::new(["users"])?)
            .await?
            .into_iter()
            .map(|(_, user)| user)
            .collect();
        users.sort_by(|a: &User, b: &User| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    /// Change the display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown user.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn update_display_name(
        &self,
        email: &Email,
        display_name: &str,
    ) -> Result<(), RepositoryError> {
        let path = Self::user_path(email)?;
        if record::<User>(self.db, &path).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("user {email}")));
        }
        self.db
            .update(&path, &json!({ "displayName": display_name }))
            .await?;
        Ok(())
    }

    /// Add one order worth `order_total` to the user's aggregates.
    ///
    /// Unknown users are skipped. Concurrent calls for the same user can
    /// lose an update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the store request fails.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn record_order(
        &self,
        email: &Email,
        order_total: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let path = Self::user_path(email)?;
        let Some(mut user) = record::<User>(self.db, &path).await? else {
            debug!("No user record, skipping order aggregates");
            return Ok(());
        };

        user.record_order(order_total, now);
        let fields = serde_json::to_value(OrderAggregates {
            total_orders: user.total_orders,
            total_spent: user.total_spent,
            last_login: user.last_login,
        })
        .map_err(StoreError::from)?;
        self.db.update(&path, &fields).await?;
        Ok(())
    }

    /// Account statistics, if the user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored record is invalid.
    pub async fn stats(&self, email: &Email) -> Result<Option<UserStats>, RepositoryError> {
        Ok(self.get(email).await?.map(|user| user.stats()))
    }
}
