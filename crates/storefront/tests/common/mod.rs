//! Shared helpers for storefront integration tests.
//!
//! Every test gets its own `MockServer` standing in for both the Storefront
//! API and the Customer Account API, and drives the full router with
//! `oneshot`, so no real network traffic is made.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use novabox_storefront::{
    app,
    config::{AnalyticsConfig, SentryConfig, ShopifyStorefrontConfig, StorefrontConfig},
    content::ContentStore,
    services::ContactService,
    shopify::{CustomerClient, StorefrontClient},
    state::AppState,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// Path the mock Storefront API listens on.
pub const STOREFRONT_PATH: &str = "/api/graphql.json";

/// Path the mock Customer Account API listens on.
pub const CUSTOMER_PATH: &str = "/customer/graphql";

/// Client IP sent on every request so the rate limiters can key it.
pub const CLIENT_IP: &str = "203.0.113.7";

pub fn test_config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        content_dir: PathBuf::from("content"),
        static_dir: PathBuf::from("static"),
        contact_email: "support@novabox.digital".to_string(),
        hdr_asset_base_url: format!("{}/hdri", server.uri()),
        shopify: ShopifyStorefrontConfig {
            store: "novabox-test.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_public_token: "public_token_value".to_string(),
            storefront_private_token: SecretString::from("private_token_value"),
            customer_shop_id: "12345678901".to_string(),
            customer_client_id: "client_id_value".to_string(),
            customer_client_secret: SecretString::from("client_secret_value"),
        },
        klaviyo: None,
        analytics: AnalyticsConfig::default(),
        sentry: SentryConfig::default(),
        json_logs: false,
    }
}

/// Storefront client pointed at the mock server.
pub fn storefront_client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::with_endpoint(
        format!("{}{STOREFRONT_PATH}", server.uri()),
        "private_token_value",
    )
}

/// Full application router backed by the mock server.
pub fn test_app(server: &MockServer) -> Router {
    let customer = CustomerClient::with_base_urls(
        server.uri(),
        format!("{}{CUSTOMER_PATH}", server.uri()),
        "client_id_value",
        "client_secret_value",
    );
    let state = AppState::with_clients(
        test_config(server),
        storefront_client(server),
        customer,
        ContentStore::default(),
        ContactService::new(None),
    )
    .expect("build app state");

    app(state)
}

/// `GET` request with the test client IP.
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::empty())
        .expect("request")
}

/// Form `POST` with the test client IP.
pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::from(body.to_owned()))
        .expect("request")
}

/// Mark a request as coming from htmx.
pub fn htmx(mut request: Request<Body>) -> Request<Body> {
    request
        .headers_mut()
        .insert("hx-request", "true".parse().unwrap());
    request
}

/// Attach a session cookie.
pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// `name=value` part of the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

pub fn money(amount: &str) -> Value {
    json!({ "amount": amount, "currencyCode": "USD" })
}

/// Storefront `Cart` with one line of `quantity` Nova Boxes.
pub fn cart_json(quantity: i64) -> Value {
    json!({
        "id": "gid://shopify/Cart/c1?key=abc",
        "checkoutUrl": "https://novabox-test.myshopify.com/cart/c/c1?key=abc",
        "note": null,
        "totalQuantity": quantity,
        "buyerIdentity": null,
        "cost": {
            "subtotalAmount": money("98.0"),
            "totalAmount": money("98.0"),
            "totalTaxAmount": null
        },
        "discountCodes": [],
        "appliedGiftCards": [],
        "lines": {
            "nodes": [{
                "id": "gid://shopify/CartLine/1?cart=c1",
                "quantity": quantity,
                "cost": {
                    "amountPerQuantity": money("49.0"),
                    "compareAtAmountPerQuantity": null,
                    "totalAmount": money("98.0")
                },
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/1",
                    "title": "Walnut",
                    "availableForSale": true,
                    "price": money("49.0"),
                    "compareAtPrice": null,
                    "selectedOptions": [{ "name": "Finish", "value": "Walnut" }],
                    "image": null,
                    "product": {
                        "id": "gid://shopify/Product/1",
                        "handle": "nova-box",
                        "title": "Nova Box",
                        "vendor": "Novabox"
                    }
                }
            }]
        }
    })
}

/// Customer Account API `Customer` with the given addresses.
pub fn customer_json(addresses: &[Value]) -> Value {
    json!({
        "id": "gid://shopify/Customer/1",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "emailAddress": { "emailAddress": "ada@example.com" },
        "phoneNumber": null,
        "defaultAddress": addresses.first(),
        "addresses": { "nodes": addresses }
    })
}

pub fn address_json(id: &str, address1: &str) -> Value {
    json!({
        "id": id,
        "formatted": ["Ada Lovelace", address1, "Ottawa ON K1A 0B1", "Canada"],
        "firstName": "Ada",
        "lastName": "Lovelace",
        "company": null,
        "address1": address1,
        "address2": null,
        "territoryCode": "CA",
        "zoneCode": "ON",
        "city": "Ottawa",
        "zip": "K1A 0B1",
        "phoneNumber": null
    })
}
