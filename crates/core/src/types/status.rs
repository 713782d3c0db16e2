//! Order status and its allowed transitions.
//!
//! ```text
//! pending -> confirmed -> processing -> shipped -> delivered
//!    \           \             \           \
//!     +-----------+-------------+-----------+--> cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. Writing the current status again
//! is allowed and only appends a timeline entry.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised by status parsing and validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// Unknown status name.
    #[error("unknown order status: {0}")]
    Unknown(String),
    /// Transition not permitted by the order lifecycle.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted, awaiting store confirmation.
    #[default]
    Pending,
    /// Accepted by the store.
    Confirmed,
    /// Items are being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled by the store or customer.
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Timeline note used when an update carries no note of its own.
    #[must_use]
    pub const fn default_note(self) -> &'static str {
        match self {
            Self::Pending => "Order created and sent to the store",
            Self::Confirmed => "The store has confirmed the order",
            Self::Processing => "Preparing items for the customer",
            Self::Shipped => "Items have been shipped",
            Self::Delivered => "Items have been delivered",
            Self::Cancelled => "Order cancelled",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self as u8 == next as u8 {
            return true;
        }
        match (self, next) {
            (from, Self::Cancelled) => !from.is_terminal(),
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Processing)
            | (Self::Processing, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            _ => false,
        }
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::InvalidTransition`] when the lifecycle does not
    /// allow it.
    pub const fn check_transition(self, next: Self) -> Result<(), StatusError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(StatusError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatusError::Unknown(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        use OrderStatus::{Confirmed, Delivered, Pending, Processing, Shipped};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        use OrderStatus::{Confirmed, Delivered, Pending, Shipped};

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        for status in OrderStatus::ALL {
            let allowed = status.can_transition_to(OrderStatus::Cancelled);
            assert_eq!(
                allowed,
                !status.is_terminal() || status == OrderStatus::Cancelled,
                "{status}"
            );
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_same_status_is_allowed() {
        for status in OrderStatus::ALL {
            assert!(status.check_transition(status).is_ok());
        }
    }

    #[test]
    fn test_check_transition_error() {
        let err = OrderStatus::Delivered
            .check_transition(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move order from delivered to pending");
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!(matches!(
            "lost".parse::<OrderStatus>(),
            Err(StatusError::Unknown(_))
        ));
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn test_every_status_has_a_note() {
        for status in OrderStatus::ALL {
            assert!(!status.default_note().is_empty());
        }
    }
}
