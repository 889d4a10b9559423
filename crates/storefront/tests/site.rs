//! Integration tests for the public, mostly read-only routes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{STOREFRONT_PATH, body_text, get, htmx, post_form, send, test_app};

#[tokio::test]
async fn health_is_ok_without_upstream() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn readiness_reports_shopify_outage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, get("/health/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn robots_points_at_sitemap() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/robots.txt")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Disallow: /account"));
    assert!(body.contains("Sitemap: http://localhost:3000/sitemap.xml"));
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/definitely/not/here")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("content-security-policy"));
    assert_eq!(
        response.headers().get("x-frame-options").unwrap(),
        "DENY"
    );
    assert!(body_text(response).await.contains("Back to Home"));
}

#[tokio::test]
async fn legacy_sitemap_redirects_permanently() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/sitemap/products/1.xml")).await;

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(common::location(&response), "/sitemap.xml");
}

#[tokio::test]
async fn predictive_search_with_blank_term_skips_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, htmx(get("/search/predictive?q=%20%20"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.trim().is_empty());
}

#[tokio::test]
async fn predictive_search_renders_grouped_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "variables": { "term": "nova" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "predictiveSearch": {
                    "articles": [],
                    "collections": [],
                    "pages": [],
                    "products": [{
                        "id": "gid://shopify/Product/1",
                        "handle": "nova-box",
                        "title": "Nova Box",
                        "trackingParameters": "_pos=1",
                        "selectedOrFirstAvailableVariant": {
                            "id": "gid://shopify/ProductVariant/1",
                            "title": "Default Title",
                            "availableForSale": true,
                            "price": { "amount": "49.0", "currencyCode": "USD" },
                            "selectedOptions": [],
                            "image": null
                        }
                    }],
                    "queries": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, htmx(get("/search/predictive?q=nova"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Nova Box"));
    assert!(body.contains("$49.00"));
    assert!(body.contains("/products/nova-box?_pos=1&amp;q=nova"));
    assert!(body.contains("View all results for"));
}

#[tokio::test]
async fn predictive_search_failure_shows_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, htmx(get("/search/predictive?q=nova"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No results found for"));
}

#[tokio::test]
async fn contact_rejects_invalid_submission() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(
        &app,
        post_form("/contact", "name=Ada&email=not-an-email&message="),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("Please correct the errors in the form"));
    assert!(body.contains("Please enter a valid email address"));
    assert!(body.contains("Message is required"));
    // Submitted values are kept
    assert!(body.contains("value=\"Ada\""));
}

#[tokio::test]
async fn contact_without_klaviyo_points_at_email() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(
        &app,
        post_form(
            "/contact",
            "name=Ada&email=ada%40example.com&subject=Hi&message=Hello+there",
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("For a faster reply, email us at support@novabox.digital"));
    assert!(!body.contains("<form method=\"post\" action=\"/contact\""));
}

#[tokio::test]
async fn account_pages_require_sign_in() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/account/orders")).await;
    assert!(response.status().is_redirection());
    assert_eq!(common::location(&response), "/account/login");

    let response = send(&app, htmx(get("/account/addresses"))).await;
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/account/login"
    );
}
