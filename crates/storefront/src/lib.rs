//! Novabox storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. [`app`] assembles the full router
//! with its middleware stack; `main.rs` only adds configuration, telemetry
//! and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod services;
pub mod shopify;
pub mod state;
pub mod variants;
pub mod views;

use axum::{Router, http::Request, http::StatusCode, response::IntoResponse};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ErrorTemplate;
use crate::state::AppState;

/// Fallback for unmatched routes.
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, ErrorTemplate::not_found())
}

/// Build the storefront router with its middleware stack.
///
/// Layers run outermost first: Sentry, tracing span, request id, CSP nonce,
/// security headers, then the session.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config().static_dir.clone();
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
