//! Proxy for the 3D hero's HDR environment maps.
//!
//! The maps are hosted upstream without CORS headers; serving them from our
//! origin lets the WebGL loader fetch them under the page's CSP.

use std::sync::LazyLock;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::instrument;

use crate::error::ErrorTemplate;
use crate::state::AppState;

static HDR_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+\.hdr$").expect("Invalid regex"));

/// Whether `file` is an environment map name we are willing to proxy.
fn is_valid_hdr_name(file: &str) -> bool {
    HDR_FILE_RE.is_match(file) && !file.contains("..")
}

fn load_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to load environment map",
    )
        .into_response()
}

/// Stream an environment map from `HDR_ASSET_BASE_URL`.
#[instrument(skip(state))]
pub async fn environment_map(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    if !is_valid_hdr_name(&file) {
        return (StatusCode::NOT_FOUND, ErrorTemplate::not_found()).into_response();
    }

    let url = format!(
        "{}/{file}",
        state.config().hdr_asset_base_url.trim_end_matches('/')
    );

    let upstream = match state.http().get(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::error!(%url, status = %response.status(), "Environment map upstream error");
            return load_failed();
        }
        Err(e) => {
            tracing::error!(%url, error = %e, "Environment map fetch failed");
            return load_failed();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "public, max-age=31536000"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response()
}
