//! Storefront-only models.
//!
//! Domain records live in `sml_market_core`; this module holds what only the
//! HTTP layer needs.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
