//! Core types for the Novabox storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod gid;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use gid::{GidError, ShopifyGid};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::{FinancialStatus, FulfillmentStatus, StatusTone};
