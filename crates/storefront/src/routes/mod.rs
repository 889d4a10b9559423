//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (Storefront API reachable)
//!
//! # Catalog
//! GET  /collections               - Collection grid
//! GET  /collections/all           - Every product, paginated
//! GET  /collections/{handle}      - Collection detail, paginated
//! GET  /products/{handle}         - Product detail (?Option=Value selects a variant)
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart                      - Cart action (cartAction + inputs)
//! GET  /cart/count                - Cart count badge (fragment)
//! GET  /cart/{lines}              - Permalink: variantId:qty,... -> checkout
//! GET  /checkout                  - Redirect to Shopify checkout
//!
//! # Search
//! GET  /search                    - Full search results
//! GET  /search/predictive         - Typeahead dropdown (fragment)
//!
//! # Customer account (Shopify OAuth)
//! GET  /account                   - Redirect to orders
//! GET  /account/login             - Start OAuth
//! GET  /account/authorize         - OAuth callback
//! POST /account/logout            - Clear session, Shopify logout
//! GET  /account/orders            - Order history
//! GET  /account/orders/{token}    - Order detail
//! GET  /account/profile           - Profile form
//! POST /account/profile           - Update profile
//! GET  /account/addresses         - Address book
//! POST /account/addresses         - Create address
//! PUT  /account/addresses/{id}    - Update address
//! DEL  /account/addresses/{id}    - Delete address
//! POST /account/addresses/{id}    - Update or delete via `_method`
//!
//! # Content
//! GET  /pages/{handle}            - Markdown or Shopify page
//! GET  /about, /services          - Aliases for the markdown pages
//! GET  /contact, /pages/contact   - Contact form (POST submits)
//! GET  /policies                  - Legal policies
//! GET  /policies/{handle}         - One policy
//! GET  /blogs/{blog}/{handle}     - Blog article
//!
//! # SEO & assets
//! GET  /robots.txt
//! GET  /sitemap.xml
//! GET  /sitemap/{type}/{page}     - Legacy sitemap index -> /sitemap.xml
//! GET  /assets/env/{file}         - HDR environment map proxy
//! ```

pub mod account;
pub mod assets;
pub mod blogs;
pub mod cart;
pub mod collections;
pub mod contact;
pub mod health;
pub mod home;
pub mod pages;
pub mod products;
pub mod search;
pub mod seo;
pub mod shopify_auth;

use axum::{
    Router,
    handler::Handler,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, cart_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// `Cache-Control` for pages that must never be stored.
pub const NO_STORE: &str = "no-cache, no-store, must-revalidate";

/// Whether the request was made by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

/// `path` if it is a local absolute path (no scheme, host or `//`).
///
/// Browsers drop tabs and newlines from `Location` before resolving it, so
/// any control character or whitespace is rejected outright.
#[must_use]
pub fn same_site_path(path: &str) -> Option<&str> {
    if path
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace() || c == '\\')
    {
        return None;
    }
    (path.starts_with('/') && !path.starts_with("//")).then_some(path)
}

/// Create the catalog routes router.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/collections", get(collections::index))
        .route("/collections/all", get(collections::all))
        .route("/collections/{handle}", get(collections::show))
        .route("/products/{handle}", get(products::show))
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cart",
            get(cart::show).post(cart::action.layer(cart_rate_limiter())),
        )
        .route("/cart/count", get(cart::count))
        .route("/cart/{lines}", get(cart::permalink))
        .route("/checkout", get(cart::checkout))
}

/// Create the account routes router.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::index))
        .route(
            "/account/login",
            get(shopify_auth::login.layer(auth_rate_limiter())),
        )
        .route(
            "/account/authorize",
            get(shopify_auth::callback.layer(auth_rate_limiter())),
        )
        .route("/account/logout", post(shopify_auth::logout))
        .route("/account/orders", get(account::orders::index))
        .route("/account/orders/{token}", get(account::orders::show))
        .route(
            "/account/profile",
            get(account::profile::show).post(account::profile::update),
        )
        .route(
            "/account/addresses",
            get(account::addresses::index).post(account::addresses::create),
        )
        .route(
            "/account/addresses/{id}",
            post(account::addresses::dispatch)
                .put(account::addresses::update)
                .delete(account::addresses::delete),
        )
}

/// Create the content routes router.
fn content_routes() -> Router<AppState> {
    let contact = || get(contact::show).post(contact::submit.layer(form_rate_limiter()));

    Router::new()
        .route("/contact", contact())
        .route("/pages/contact", contact())
        .route("/pages/{handle}", get(pages::show))
        .route("/about", get(pages::about))
        .route("/services", get(pages::services))
        .route("/policies", get(pages::policies))
        .route("/policies/{handle}", get(pages::policy))
        .route("/blogs/{blog}/{handle}", get(blogs::article))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/search", get(search::index))
        .route("/search/predictive", get(search::predictive))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/sitemap/{kind}/{page}", get(seo::legacy_sitemap))
        .route("/assets/env/{file}", get(assets::environment_map))
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(account_routes())
        .merge(content_routes())
}
