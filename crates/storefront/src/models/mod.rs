//! Session-backed models for the storefront.
//!
//! Everything durable lives in Shopify; the session only holds pointers to
//! it (the cart id and the customer's OAuth tokens).

pub mod session;

pub use session::{CartSession, keys as session_keys};
