//! SML Market Core - Domain types and business rules.
//!
//! This crate provides the types shared by all SML Market components:
//! - `storefront` - HTTP API, store accessor and repositories
//! - `cli` - Operator tooling for orders and users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no store
//! access, no HTTP clients. Order numbering, total computation, status
//! transitions and quotation math all live here so they can be tested
//! without a database.
//!
//! # Modules
//!
//! - [`types`] - Emails, user keys, order numbers, line items, orders,
//!   product codes and quotations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
