//! Order repository.
//!
//! Orders live at `orders/{orderNumber}` and are never deleted. Numbers come
//! from the per-day counter at `counters/orderNumber/{dateKey}`, where the
//! day is taken in the shop's local offset.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{info, instrument};

use sml_market_core::{
    DateKey, Email, NegotiatedPrice, Order, OrderError, OrderItem, OrderNumber, OrderStatus,
    PriceNegotiation,
};

use super::{RepositoryError, UserRepository, children, record};
use crate::store::{Database, StorePath};

/// Repository for order operations.
pub struct OrderRepository<'a> {
    db: &'a Database,
    utc_offset: FixedOffset,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository dating orders in `utc_offset`.
    #[must_use]
    pub const fn new(db: &'a Database, utc_offset: FixedOffset) -> Self {
        Self { db, utc_offset }
    }

    fn order_path(order_number: &OrderNumber) -> Result<StorePath, RepositoryError> {
        Ok(StorePath::new(["orders", order_number.as_str()])?)
    }

    /// Reserve the next order number for the day containing `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the counter cannot be incremented.
    #[instrument(skip(self))]
    pub async fn allocate_number(&self, now: DateTime<Utc>) -> Result<OrderNumber, RepositoryError> {
        let date = now.with_timezone(&self.utc_offset).date_naive();
        let key = DateKey::from_date(date);
        let path = StorePath::new(["counters", "orderNumber", key.as_str()])?;

        let counter = self.db.increment(&path, 1).await?;
        let counter = u64::try_from(counter).map_err(|_| {
            RepositoryError::DataCorruption(format!("order counter {path} is negative"))
        })?;
        Ok(OrderNumber::generate(date, counter))
    }

    /// Place a new pending order and add it to the customer's aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Order(OrderError::Empty)` for an order with
    /// no items; no number is allocated in that case.
    #[instrument(skip(self, items, customer_note, negotiation), fields(user = %email, items = items.len()))]
    pub async fn create(
        &self,
        email: &Email,
        items: Vec<OrderItem>,
        customer_note: String,
        negotiation: Option<PriceNegotiation>,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        if items.is_empty() {
            return Err(OrderError::Empty.into());
        }

        let order_number = self.allocate_number(now).await?;
        let order = Order::new(
            order_number,
            email.clone(),
            items,
            customer_note,
            negotiation,
            now,
        )?;

        self.db
            .set_json(&Self::order_path(&order.order_number)?, &order)
            .await?;
        UserRepository::new(self.db)
            .record_order(email, order.grand_total(), now)
            .await?;

        info!(order_number = %order.order_number, total = %order.grand_total(), "Order created");
        Ok(order)
    }

    /// Get an order by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored order is invalid.
    pub async fn get(&self, order_number: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        record(self.db, &Self::order_path(order_number)?).await
    }

    async fn get_required(&self, order_number: &OrderNumber) -> Result<Order, RepositoryError> {
        self.get(order_number)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("order {order_number}")))
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = children(self.db, &StorePath::new(["orders"])?)
            .await?
            .into_iter()
            .map(|(_, order)| order)
            .collect();
        orders.sort_by(|a: &Order, b: &Order| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_number.as_str().cmp(a.order_number.as_str()))
        });
        Ok(orders)
    }

    /// Orders placed by `email`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list_for_user(&self, email: &Email) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.list_all().await?;
        orders.retain(|order| order.belongs_to(email));
        Ok(orders)
    }

    /// Orders currently in `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.list_all().await?;
        orders.retain(|order| order.status == status);
        Ok(orders)
    }

    /// Move an order to `status`, appending a timeline entry.
    ///
    /// An empty `note` uses the status's default note. `force` skips the
    /// lifecycle check.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::Order` for a disallowed transition.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn update_status(
        &self,
        order_number: &OrderNumber,
        status: OrderStatus,
        note: &str,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut order = self.get_required(order_number).await?;
        let from = order.status;
        order.transition(status, note, force, now)?;

        self.db
            .set_json(&Self::order_path(order_number)?, &order)
            .await?;
        info!(from = %from.as_str(), to = %status.as_str(), force, "Order status changed");
        Ok(order)
    }

    /// Record negotiated prices and recompute totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::Order` for an empty request or a negative price.
    #[instrument(skip(self, prices), fields(order_number = %order_number, prices = prices.len()))]
    pub async fn apply_negotiation(
        &self,
        order_number: &OrderNumber,
        prices: &[NegotiatedPrice],
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut order = self.get_required(order_number).await?;
        order.apply_negotiation(prices, now)?;

        self.db
            .set_json(&Self::order_path(order_number)?, &order)
            .await?;
        info!(
            accepted_total = %order.accepted_total,
            negotiated_total = %order.negotiated_total,
            "Negotiated prices applied"
        );
        Ok(order)
    }
}
