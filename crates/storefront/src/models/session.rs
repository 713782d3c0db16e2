//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use sml_market_core::Email;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Customer's email address.
    pub email: Email,
    /// Name shown in the storefront header.
    pub display_name: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
