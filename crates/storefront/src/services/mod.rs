//! Business logic services for storefront.
//!
//! # Services
//!
//! - `klaviyo` - Klaviyo Events API client
//! - `contact` - Contact form delivery (Klaviyo event, or log only)

pub mod contact;
pub mod klaviyo;

pub use contact::{ContactDelivery, ContactService, ContactSubmission};
pub use klaviyo::{KlaviyoClient, KlaviyoError};
