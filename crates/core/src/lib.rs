//! Novabox Core - Shared domain types.
//!
//! This crate provides the types the storefront uses to talk about Shopify
//! data without depending on any HTTP or GraphQL machinery:
//! - [`Email`] - validated email addresses (contact form, customer profile)
//! - [`Price`] / [`CurrencyCode`] - decimal money with display formatting
//! - [`ShopifyGid`] - Shopify global IDs and their URL-safe tokens
//! - [`FulfillmentStatus`] / [`FinancialStatus`] - order status badges
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and easy to test.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
