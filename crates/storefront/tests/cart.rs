//! Integration tests for the cart routes.
//!
//! The cart id lives in the session, so tests that span requests carry the
//! session cookie from the first response forward.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    STOREFRONT_PATH, body_text, cart_json, get, htmx, location, post_form, send,
    session_cookie, test_app, with_cookie,
};

const ADD_NOVA_BOX: &str =
    "cartAction=LinesAdd&merchandiseId=gid%3A%2F%2Fshopify%2FProductVariant%2F1&quantity=2";

async fn mock_operation(server: &MockServer, operation: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "operationName": operation })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": body })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn add_to_cart_creates_cart_and_renders_fragment() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(2), "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    let response = send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "cart-updated");
    assert!(session_cookie(&response).is_some());
    let body = body_text(response).await;
    assert!(body.contains("id=\"cart\""));
    assert!(body.contains("Nova Box"));
    assert!(body.contains("Finish: Walnut"));
    assert!(body.contains("$98.00"));
}

#[tokio::test]
async fn add_to_cart_without_htmx_redirects() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(1), "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    let response = send(
        &app,
        post_form("/cart", &format!("{ADD_NOVA_BOX}&redirectTo=%2Fproducts%2Fnova-box")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products/nova-box");
}

#[tokio::test]
async fn offsite_redirect_falls_back_to_cart() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(1), "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    let response = send(
        &app,
        post_form("/cart", &format!("{ADD_NOVA_BOX}&redirectTo=%2F%2Fevil.example")),
    )
    .await;

    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn redirect_with_smuggled_control_characters_falls_back_to_cart() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(1), "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    for target in ["%2F%09%2Fevil.example", "%2F%0D%0A%2Fevil.example"] {
        let response = send(
            &app,
            post_form("/cart", &format!("{ADD_NOVA_BOX}&redirectTo={target}")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/cart");
    }
}

#[tokio::test]
async fn count_reads_stored_cart() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(2), "userErrors": [] } }),
    )
    .await;
    mock_operation(&server, "GetCart", json!({ "cart": cart_json(2) })).await;
    let app = test_app(&server);

    let response = send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await;
    let cookie = session_cookie(&response).expect("session cookie");

    let response = send(&app, with_cookie(get("/cart/count"), &cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(">2</span>"));
}

#[tokio::test]
async fn count_without_cart_is_zero() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/cart/count")).await;

    assert!(body_text(response).await.contains(">0</span>"));
}

#[tokio::test]
async fn rejected_discount_code_is_shown_in_cart() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(2), "userErrors": [] } }),
    )
    .await;
    mock_operation(&server, "GetCart", json!({ "cart": cart_json(2) })).await;
    mock_operation(
        &server,
        "CartDiscountCodesUpdate",
        json!({
            "cartDiscountCodesUpdate": {
                "cart": null,
                "userErrors": [{ "field": ["discountCodes"], "message": "Discount code BOGUS is invalid", "code": "INVALID" }]
            }
        }),
    )
    .await;
    let app = test_app(&server);

    let response = send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await;
    let cookie = session_cookie(&response).expect("session cookie");

    let response = send(
        &app,
        with_cookie(
            htmx(post_form("/cart", "cartAction=DiscountCodesUpdate&discountCode=BOGUS")),
            &cookie,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Discount code BOGUS is invalid"));
    // The cart itself still renders
    assert!(body.contains("Nova Box"));
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, post_form("/cart", "cartAction=Explode")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn updating_without_cart_reports_empty_cart() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(
        &app,
        htmx(post_form(
            "/cart",
            "cartAction=LinesUpdate&lineId=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=3",
        )),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Your cart is empty"));
}

#[tokio::test]
async fn empty_cart_page_links_to_collections() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/cart")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    let body = body_text(response).await;
    assert!(body.contains("Your cart is empty"));
    assert!(body.contains("href=\"/collections\""));
}

#[tokio::test]
async fn checkout_without_cart_returns_to_cart() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = send(&app, get("/checkout")).await;

    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn permalink_builds_cart_and_redirects_to_checkout() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(2), "userErrors": [] } }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({
            "operationName": "CartDiscountCodesUpdate",
            "variables": { "discountCodes": ["WELCOME"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cartDiscountCodesUpdate": { "cart": cart_json(2), "userErrors": [] } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, get("/cart/1:2?discount=WELCOME")).await;

    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        "https://novabox-test.myshopify.com/cart/c/c1?key=abc"
    );
}

/// The `<button ...>` tag whose `aria-label` is `label`.
fn button_tag<'a>(body: &'a str, label: &str) -> &'a str {
    let marker = format!("aria-label=\"{label}\"");
    let at = body.find(&marker).expect("button rendered");
    let start = body.get(..at).and_then(|b| b.rfind("<button")).expect("button start");
    let end = body.get(at..).and_then(|rest| rest.find('>')).expect("button end");
    body.get(start..at + end).expect("button tag")
}

#[tokio::test]
async fn single_item_line_disables_only_decrease() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(1), "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    let response = send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(button_tag(&body, "Decrease quantity").contains("disabled"));
    assert!(!button_tag(&body, "Increase quantity").contains("disabled"));
    // Every cart form disables its buttons while in flight
    let forms = body.matches(r#"hx-post="/cart""#).count();
    assert!(forms > 0);
    assert_eq!(body.matches(r#"hx-disabled-elt="find button""#).count(), forms);
}

#[tokio::test]
async fn pending_line_disables_every_control() {
    let server = MockServer::start().await;
    let mut cart = cart_json(3);
    cart["lines"]["nodes"][0]["id"] = json!("optimistic-1");
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart, "userErrors": [] } }),
    )
    .await;
    let app = test_app(&server);

    let body = body_text(send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await).await;

    assert!(body.contains("cart-line--pending"));
    assert!(button_tag(&body, "Decrease quantity").contains("disabled"));
    assert!(button_tag(&body, "Increase quantity").contains("disabled"));
    assert!(body.contains(r#"class="cart-line__remove" disabled"#));
}

#[tokio::test]
async fn blank_discount_code_keeps_applied_codes() {
    let server = MockServer::start().await;
    mock_operation(
        &server,
        "CartCreate",
        json!({ "cartCreate": { "cart": cart_json(2), "userErrors": [] } }),
    )
    .await;
    mock_operation(&server, "GetCart", json!({ "cart": cart_json(2) })).await;
    Mock::given(method("POST"))
        .and(path(STOREFRONT_PATH))
        .and(body_partial_json(json!({ "operationName": "CartDiscountCodesUpdate" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let app = test_app(&server);

    let response = send(&app, htmx(post_form("/cart", ADD_NOVA_BOX))).await;
    let cookie = session_cookie(&response).expect("session cookie");

    let response = send(
        &app,
        with_cookie(
            htmx(post_form("/cart", "cartAction=DiscountCodesUpdate&discountCode=")),
            &cookie,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Nova Box"));
}
