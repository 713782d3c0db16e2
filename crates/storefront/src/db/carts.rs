//! Cart repository.
//!
//! One cart per customer at `carts/{userKey}`, each line stored under its
//! push id.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::instrument;

use sml_market_core::{CartItem, CartItemError, CartSummary, Email, NewCartItem};

use super::{RepositoryError, children, record};
use crate::store::{Database, StorePath};

/// Repository for cart operations.
pub struct CartRepository<'a> {
    db: &'a Database,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn cart_path(email: &Email) -> Result<StorePath, RepositoryError> {
        Ok(StorePath::new(["carts", email.user_key().as_str()])?)
    }

    fn item_path(email: &Email, item_id: &str) -> Result<StorePath, RepositoryError> {
        Ok(Self::cart_path(email)?.child(item_id)?)
    }

    /// Add a new line to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CartItem` if the line is invalid.
    #[instrument(skip(self, item), fields(user = %email, product_id = %item.product_id))]
    pub async fn add(
        &self,
        email: &Email,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<CartItem, RepositoryError> {
        item.validate()?;

        let mut cart_item = item.into_cart_item(now);
        let id = self.db.push_json(&Self::cart_path(email)?, &cart_item).await?;
        cart_item.id = Some(id);
        Ok(cart_item)
    }

    /// All lines in the cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored line is invalid.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn list(&self, email: &Email) -> Result<Vec<CartItem>, RepositoryError> {
        let mut items: Vec<CartItem> = children::<CartItem>(self.db, &Self::cart_path(email)?)
            .await?
            .into_iter()
            .map(|(id, mut item)| {
                item.id = Some(id);
                item
            })
            .collect();

        items.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Set the quantity of one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CartItem` for a zero quantity and
    /// `RepositoryError::NotFound` if the line does not exist.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn update_quantity(
        &self,
        email: &Email,
        item_id: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if quantity == 0 {
            return Err(CartItemError::ZeroQuantity.into());
        }

        let path = Self::item_path(email, item_id)?;
        if record::<CartItem>(self.db, &path).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("cart item {item_id}")));
        }

        self.db
            .update(&path, &json!({ "quantity": quantity, "updatedAt": now }))
            .await?;
        Ok(())
    }

    /// Remove one line. Removing a missing line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the store request fails.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn remove(&self, email: &Email, item_id: &str) -> Result<(), RepositoryError> {
        self.db.remove(&Self::item_path(email, item_id)?).await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the store request fails.
    #[instrument(skip(self), fields(user = %email))]
    pub async fn clear(&self, email: &Email) -> Result<(), RepositoryError> {
        self.db.remove(&Self::cart_path(email)?).await?;
        Ok(())
    }

    /// Item count and total value of the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cart cannot be read.
    pub async fn summary(&self, email: &Email) -> Result<CartSummary, RepositoryError> {
        Ok(CartSummary::compute(&self.list(email).await?))
    }

    /// Sum of quantities over all lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cart cannot be read.
    pub async fn item_count(&self, email: &Email) -> Result<u64, RepositoryError> {
        Ok(self.summary(email).await?.item_count)
    }

    /// Sum of `price × quantity` over all lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cart cannot be read.
    pub async fn total(&self, email: &Email) -> Result<rust_decimal::Decimal, RepositoryError> {
        Ok(self.summary(email).await?.total)
    }

    /// Whether any line holds `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cart cannot be read.
    pub async fn contains_product(
        &self,
        email: &Email,
        product_id: &str,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .list(email)
            .await?
            .iter()
            .any(|item| item.product_id == product_id))
    }

    /// Add to an existing line for the same product, or push a new one.
    ///
    /// Not atomic: two concurrent adds of a new product can create two lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CartItem` if the line is invalid.
    #[instrument(skip(self, item), fields(user = %email, product_id = %item.product_id))]
    pub async fn add_or_increment(
        &self,
        email: &Email,
        item: NewCartItem,
        now: DateTime<Utc>,
    ) -> Result<CartItem, RepositoryError> {
        item.validate()?;

        let existing = self
            .list(email)
            .await?
            .into_iter()
            .find(|line| line.product_id == item.product_id);

        match existing {
            Some(mut line) => {
                let id = line
                    .id
                    .clone()
                    .ok_or_else(|| RepositoryError::DataCorruption("cart line without id".to_owned()))?;
                line.quantity = line.quantity.saturating_add(item.quantity);
                line.updated_at = now;
                self.update_quantity(email, &id, line.quantity, now).await?;
                Ok(line)
            }
            None => self.add(email, item, now).await,
        }
    }
}
