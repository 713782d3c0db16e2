//! Core types for SML Market.
//!
//! This module provides type-safe wrappers and domain records.

pub mod email;
pub mod line_item;
pub mod money;
pub mod order;
pub mod order_number;
pub mod product_code;
pub mod quotation;
pub mod status;
pub mod user;
pub mod user_key;

pub use email::{Email, EmailError};
pub use line_item::{CartItem, CartItemError, CartSummary, NewCartItem, OrderItem, OrderTotals};
pub use money::{VAT_RATE, format_thb};
pub use order::{NegotiatedPrice, Order, OrderError, PriceNegotiation, TimelineEntry};
pub use order_number::{DateKey, OrderNumber, OrderNumberError};
pub use product_code::{
    MAX_PRODUCT_CODE_LENGTH, ProductCodeError, decode_product_code, encode_product_code,
    is_valid_product_code, product_path, resolve_product_code,
};
pub use quotation::{
    Party, Quotation, QuotationError, QuotationLine, QuotationNumber, STANDARD_TERMS,
    VALIDITY_DAYS,
};
pub use status::{OrderStatus, StatusError};
pub use user::{User, UserStats};
pub use user_key::UserKey;
