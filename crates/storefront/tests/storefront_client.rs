//! Integration tests for `StorefrontClient` error handling and caching.
//!
//! Each scenario stands up a `wiremock` server that answers the GraphQL
//! endpoint the way Shopify does.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use novabox_storefront::shopify::{CartLineInput, PageRequest, ShopifyError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{STOREFRONT_PATH, cart_json, money, storefront_client};

#[tokio::test]
async fn sends_private_token_and_operation_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(header("Shopify-Storefront-Private-Token", "private_token_value"))
        .and(body_partial_json(json!({ "operationName": "CartCreate" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cartCreate": { "cart": cart_json(2), "userErrors": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cart = storefront_client(&server)
        .create_cart(
            vec![CartLineInput::new("gid://shopify/ProductVariant/1".to_string(), 2)],
            None,
        )
        .await
        .expect("cart");

    assert_eq!(cart.total_quantity, 2);
    assert_eq!(cart.lines.len(), 1);
}

#[tokio::test]
async fn rate_limit_reports_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let result = storefront_client(&server)
        .get_products(&PageRequest::first())
        .await;

    assert!(
        matches!(result, Err(ShopifyError::RateLimited(7))),
        "expected RateLimited(7), got: {result:?}"
    );
}

#[tokio::test]
async fn graphql_errors_are_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Field 'bogus' doesn't exist on type 'Product'" }]
        })))
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .get_products(&PageRequest::first())
        .await
        .unwrap_err();

    match err {
        ShopifyError::GraphQL(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors.first().unwrap().message.contains("bogus"));
        }
        other => panic!("expected GraphQL error, got: {other:?}"),
    }
}

#[tokio::test]
async fn cart_user_errors_become_user_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "cartNoteUpdate": {
                    "cart": null,
                    "userErrors": [
                        { "field": ["note"], "message": "Note is too long", "code": "INVALID" },
                        { "field": null, "message": "Try again", "code": null }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .update_note("gid://shopify/Cart/c1", "a very long note")
        .await
        .unwrap_err();

    match err {
        ShopifyError::UserError(message) => assert_eq!(message, "Note is too long; Try again"),
        other => panic!("expected UserError, got: {other:?}"),
    }
}

#[tokio::test]
async fn missing_data_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .get_policies()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No data in response"), "{err}");
}

#[tokio::test]
async fn server_error_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = storefront_client(&server).ping().await.unwrap_err();

    assert!(err.to_string().contains("HTTP 502"), "{err}");
}

#[tokio::test]
async fn expired_cart_reads_as_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "operationName": "GetCart" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cart": null }
        })))
        .mount(&server)
        .await;

    let cart = storefront_client(&server)
        .get_cart("gid://shopify/Cart/gone")
        .await
        .expect("request succeeds");

    assert!(cart.is_none());
}

fn product_json(handle: &str) -> serde_json::Value {
    json!({
        "id": "gid://shopify/Product/1",
        "handle": handle,
        "title": "Nova Box",
        "featuredImage": null,
        "priceRange": {
            "minVariantPrice": money("49.0"),
            "maxVariantPrice": money("49.0")
        },
        "variants": { "nodes": [] }
    })
}

#[tokio::test]
async fn product_reads_are_cached_until_invalidated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({
            "operationName": "GetProductByHandle",
            "variables": { "handle": "nova-box" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": product_json("nova-box") }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = storefront_client(&server);

    let first = client.get_product_by_handle("nova-box").await.expect("product");
    let second = client.get_product_by_handle("nova-box").await.expect("cached");
    assert_eq!(first.handle, second.handle);

    client.invalidate_product("nova-box").await;
    client.get_product_by_handle("nova-box").await.expect("refetched");
}

#[tokio::test]
async fn catalog_pages_are_cached_per_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "operationName": "GetProducts" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "products": {
                    "nodes": [product_json("nova-box")],
                    "pageInfo": {
                        "hasNextPage": true,
                        "hasPreviousPage": false,
                        "startCursor": "c1",
                        "endCursor": "c12"
                    }
                }
            }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = storefront_client(&server);
    let next = PageRequest {
        after: Some("c12".to_string()),
        before: None,
    };

    client.get_products(&PageRequest::first()).await.expect("first page");
    client.get_products(&next).await.expect("second page");
    client.get_products(&PageRequest::first()).await.expect("cached first page");
    client.get_products(&next).await.expect("cached second page");

    client.invalidate_all().await;
    client.get_products(&PageRequest::first()).await.expect("refetched");
}

#[tokio::test]
async fn cart_reads_are_never_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "operationName": "GetCart" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cart": cart_json(1) }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = storefront_client(&server);
    for _ in 0..2 {
        let cart = client
            .get_cart("gid://shopify/Cart/c1?key=abc")
            .await
            .expect("request succeeds");
        assert!(cart.is_some());
    }
}
