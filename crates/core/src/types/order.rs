//! Order records.
//!
//! An order is created once at checkout and never deleted. After creation it
//! changes only through [`Order::transition`] (status updates, which append
//! to the timeline) and [`Order::apply_negotiation`] (price overrides, which
//! recompute the totals).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Email, OrderItem, OrderNumber, OrderStatus, OrderTotals, StatusError, UserKey};

/// Errors raised by order operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// An order needs at least one line.
    #[error("order has no items")]
    Empty,
    /// Status change rejected by the lifecycle.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// Negotiation request carried no prices.
    #[error("negotiation has no prices")]
    EmptyNegotiation,
    /// Negotiated price below zero.
    #[error("negotiated price for {product_id} cannot be negative")]
    NegativePrice {
        /// Offending product.
        product_id: String,
    },
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

/// Summary of a price negotiation on the order as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceNegotiation {
    pub has_negotiation: bool,
    #[serde(with = "crate::types::money::as_number")]
    pub requested_total: Decimal,
    #[serde(default)]
    pub reason: String,
}

/// A price override for one product of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiatedPrice {
    pub product_id: String,
    #[serde(with = "crate::types::money::as_number")]
    pub negotiated_price: Decimal,
    #[serde(default)]
    pub reason: String,
}

/// A placed order as stored at `orders/{orderNumber}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub user_email: Email,
    /// Key of the owning user, used to filter a customer's orders.
    pub user_id: UserKey,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_items: u64,
    #[serde(with = "crate::types::money::as_number")]
    pub accepted_total: Decimal,
    #[serde(with = "crate::types::money::as_number")]
    pub negotiated_total: Decimal,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer_note: String,
    #[serde(default)]
    pub price_negotiation: PriceNegotiation,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new pending order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Empty`] if `items` is empty.
    pub fn new(
        order_number: OrderNumber,
        user_email: Email,
        items: Vec<OrderItem>,
        customer_note: String,
        price_negotiation: Option<PriceNegotiation>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::Empty);
        }

        let totals = OrderTotals::compute(&items);
        let status = OrderStatus::Pending;

        Ok(Self {
            order_number,
            user_id: user_email.user_key(),
            user_email,
            status,
            order_date: now,
            total_items: totals.total_items,
            accepted_total: totals.accepted_total,
            negotiated_total: totals.negotiated_total,
            items,
            customer_note,
            price_negotiation: price_negotiation.unwrap_or_default(),
            timeline: vec![TimelineEntry {
                status,
                timestamp: now,
                note: status.default_note().to_owned(),
            }],
            created_at: now,
            updated_at: now,
        })
    }

    /// Current totals as stored on the record.
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            total_items: self.total_items,
            accepted_total: self.accepted_total,
            negotiated_total: self.negotiated_total,
        }
    }

    /// Amount charged for the whole order.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.accepted_total + self.negotiated_total
    }

    /// Whether `email` owns this order.
    #[must_use]
    pub fn belongs_to(&self, email: &Email) -> bool {
        self.user_id == email.user_key()
    }

    /// Move the order to `next` and record it in the timeline.
    ///
    /// An empty `note` is replaced by the status's default note. With
    /// `force`, lifecycle validation is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Status`] if the transition is not allowed and
    /// `force` is false.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        note: &str,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !force {
            self.status.check_transition(next)?;
        }

        let note = if note.trim().is_empty() {
            next.default_note().to_owned()
        } else {
            note.to_owned()
        };

        self.status = next;
        self.timeline.push(TimelineEntry {
            status: next,
            timestamp: now,
            note,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Apply negotiated prices and recompute totals.
    ///
    /// Every item whose product matches a negotiated price is marked as not
    /// accepted at the quoted price. Prices for products not in the order are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyNegotiation`] for an empty request and
    /// [`OrderError::NegativePrice`] for a price below zero. The order is left
    /// untouched on error.
    pub fn apply_negotiation(
        &mut self,
        prices: &[NegotiatedPrice],
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if prices.is_empty() {
            return Err(OrderError::EmptyNegotiation);
        }
        if let Some(bad) = prices
            .iter()
            .find(|p| p.negotiated_price.is_sign_negative() && !p.negotiated_price.is_zero())
        {
            return Err(OrderError::NegativePrice {
                product_id: bad.product_id.clone(),
            });
        }

        for item in &mut self.items {
            if let Some(price) = prices.iter().find(|p| p.product_id == item.product_id) {
                item.price_accepted = false;
                item.negotiated_price = price.negotiated_price;
                item.negotiation_reason.clone_from(&price.reason);
            }
        }

        let totals = OrderTotals::compute(&self.items);
        self.total_items = totals.total_items;
        self.accepted_total = totals.accepted_total;
        self.negotiated_total = totals.negotiated_total;
        self.price_negotiation = PriceNegotiation {
            has_negotiation: true,
            requested_total: totals.negotiated_total,
            reason: prices
                .iter()
                .map(|p| p.reason.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        self.updated_at = now;
        Ok(())
    }
}
