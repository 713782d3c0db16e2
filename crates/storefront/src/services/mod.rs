//! Business flows that span more than one repository.
//!
//! - `checkout` - turn a cart into an order
//! - `quotation` - price a cart as a printable quotation

pub mod checkout;
pub mod quotation;
