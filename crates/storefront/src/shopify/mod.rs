//! Shopify Storefront and Customer Account API clients.
//!
//! # Architecture
//!
//! - Every Storefront API operation is a type implementing
//!   `graphql_client::GraphQLQuery` (see `storefront::queries`)
//! - Shopify is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # APIs
//!
//! ## Storefront API
//! - Products, collections, pages, policies, search, cart operations
//! - Private access token for server-side operations
//!
//! ## Customer Account API
//! - OAuth authentication flow
//! - Customer profile, addresses, order history
//!
//! # Example
//!
//! ```rust,ignore
//! use novabox_storefront::shopify::{CartLineInput, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! let product = client.get_product_by_handle("nova-box").await?;
//!
//! let cart = client
//!     .create_cart(vec![CartLineInput::new(variant_id, 1)], None)
//!     .await?;
//! ```

pub mod customer;
pub mod storefront;
pub mod types;

pub use customer::CustomerClient;
pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// OAuth token exchange or refresh failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The customer access token was rejected.
    #[error("Customer access token rejected")]
    Unauthorized,
}

impl ShopifyError {
    /// A GraphQL error with a single message and no location.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }

    /// Text safe to show inside a form.
    ///
    /// User errors are the API's own validation messages; everything else
    /// collapses to a generic message so internals never reach the page.
    #[must_use]
    pub fn form_message(&self) -> String {
        match self {
            Self::UserError(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests. Please wait a moment and try again.".to_owned(),
            _ => "Something went wrong. Please try again.".to_owned(),
        }
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("product nova-box".to_string());
        assert_eq!(err.to_string(), "Not found: product nova-box");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError {
                message: "Field 'foo' doesn't exist on type 'Product'".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid global id".to_string(),
                locations: vec![],
                path: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field 'foo' doesn't exist on type 'Product'; Invalid global id"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 3, column: 7 }],
            path: vec![
                serde_json::Value::String("cart".to_string()),
                serde_json::Value::String("lines".to_string()),
                serde_json::Value::Number(2.into()),
            ],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: path: cart.lines.2 at line 3:7");
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(err.to_string(), "GraphQL errors: (no error details provided)");
    }

    #[test]
    fn test_message_helper() {
        let err = ShopifyError::message("Failed to create cart");
        assert_eq!(err.to_string(), "GraphQL errors: Failed to create cart");
    }

    #[test]
    fn test_form_message_hides_internal_errors() {
        let err = ShopifyError::UserError("Zip is invalid".to_string());
        assert_eq!(err.form_message(), "Zip is invalid");

        let err = ShopifyError::message("internal query detail");
        assert!(!err.form_message().contains("internal"));
    }
}
