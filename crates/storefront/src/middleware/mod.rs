//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record on span and Sentry scope)
//! 4. CSP nonce (per-request nonce for inline scripts)
//! 5. Security headers (nonce-aware CSP, frame and sniffing protection)
//! 6. Session layer (tower-sessions, in-memory store)
//!
//! Rate limiters are attached to individual route groups.

pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod shopify_customer;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter, form_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use shopify_customer::{
    LOGIN_PATH, OptionalShopifyCustomer, RequireShopifyCustomer, clear_shopify_customer_token,
    set_shopify_customer_token,
};
