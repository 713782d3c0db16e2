//! Customer aggregate stored at `users/{userKey}`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Email;

/// A storefront customer and their lifetime order totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: Email,
    #[serde(default)]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default, with = "crate::types::money::as_number")]
    pub total_spent: Decimal,
}

impl User {
    /// A first-time customer with empty aggregates.
    #[must_use]
    pub const fn new(email: Email, display_name: String, now: DateTime<Utc>) -> Self {
        Self {
            email,
            display_name,
            created_at: now,
            last_login: now,
            total_orders: 0,
            total_spent: Decimal::ZERO,
        }
    }

    /// Count one more order worth `order_total`.
    pub fn record_order(&mut self, order_total: Decimal, now: DateTime<Utc>) {
        self.total_orders += 1;
        self.total_spent += order_total;
        self.last_login = now;
    }

    /// Summary for the account page.
    #[must_use]
    pub const fn stats(&self) -> UserStats {
        UserStats {
            total_orders: self.total_orders,
            total_spent: self.total_spent,
            member_since: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Account statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_orders: u64,
    #[serde(with = "crate::types::money::as_number")]
    pub total_spent: Decimal,
    pub member_since: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_order() {
        let created = Utc::now();
        let mut user = User::new(
            Email::parse("test01@gmail.com").unwrap(),
            "Test User".to_owned(),
            created,
        );

        let later = created + chrono::Duration::minutes(5);
        user.record_order(Decimal::new(32_050, 2), later);
        user.record_order(Decimal::from(80), later);

        let stats = user.stats();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_spent, Decimal::new(40_050, 2));
        assert_eq!(stats.member_since, created);
        assert_eq!(stats.last_login, later);
    }

    #[test]
    fn test_missing_aggregates_default_to_zero() {
        let json = serde_json::json!({
            "email": "test01@gmail.com",
            "displayName": "Test User",
            "createdAt": "2025-06-01T03:00:00.000Z",
            "lastLogin": "2025-06-01T03:00:00.000Z"
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.total_orders, 0);
        assert_eq!(user.total_spent, Decimal::ZERO);
    }
}
