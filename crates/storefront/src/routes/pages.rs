//! Content page route handlers.
//!
//! `/pages/{handle}` serves a markdown page from the content store when one
//! exists and otherwise asks Shopify for an online-store page. Legal policies
//! always come from Shopify.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;
use crate::views::Layout;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageTemplate {
    pub layout: Layout,
    pub title: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Policy link on the policies index.
#[derive(Clone)]
pub struct PolicyLinkView {
    pub title: String,
    pub url: String,
}

/// Policies index template.
#[derive(Template, WebTemplate)]
#[template(path = "policies/index.html")]
pub struct PoliciesTemplate {
    pub layout: Layout,
    pub policies: Vec<PolicyLinkView>,
}

/// Serve a page by handle, markdown first.
async fn render_page(
    state: &AppState,
    nonce: CspNonce,
    handle: &str,
) -> Result<PageTemplate, AppError> {
    let canonical = state.config().absolute_url(&format!("/pages/{handle}"));

    if let Some(page) = state.content().get_page(handle) {
        return Ok(PageTemplate {
            layout: Layout::new(state, nonce, &page.meta.title)
                .with_description(page.meta.description.clone().unwrap_or_default())
                .with_canonical(canonical),
            title: page.meta.title.clone(),
            updated_at: page.meta.updated_at,
            content_html: page.content_html.clone(),
        });
    }

    let page = state.storefront().get_page(handle).await?;
    let seo = page.seo.unwrap_or_default();

    Ok(PageTemplate {
        layout: Layout::new(state, nonce, seo.title.as_deref().unwrap_or(&page.title))
            .with_description(seo.description.unwrap_or_default())
            .with_canonical(canonical),
        title: page.title,
        updated_at: None,
        content_html: page.body,
    })
}

/// Display a content page.
///
/// # Errors
///
/// Returns 404 when neither the content store nor Shopify has the page.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    render_page(&state, nonce, &handle).await
}

/// `/about` alias.
#[instrument(skip(state, nonce))]
pub async fn about(
    State(state): State<AppState>,
    nonce: CspNonce,
) -> Result<impl IntoResponse, AppError> {
    render_page(&state, nonce, "about").await
}

/// `/services` alias.
#[instrument(skip(state, nonce))]
pub async fn services(
    State(state): State<AppState>,
    nonce: CspNonce,
) -> Result<impl IntoResponse, AppError> {
    render_page(&state, nonce, "services").await
}

/// List the shop's legal policies.
#[instrument(skip(state, nonce))]
pub async fn policies(
    State(state): State<AppState>,
    nonce: CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let policies = state.storefront().get_policies().await?;

    Ok(PoliciesTemplate {
        layout: Layout::new(&state, nonce, "Policies"),
        policies: policies
            .into_iter()
            .map(|p| PolicyLinkView {
                url: format!("/policies/{}", p.handle),
                title: p.title,
            })
            .collect(),
    })
}

/// Display one legal policy.
#[instrument(skip(state, nonce))]
pub async fn policy(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let policy = state.storefront().get_policy(&handle).await?;

    Ok(PageTemplate {
        layout: Layout::new(&state, nonce, &policy.title)
            .with_canonical(state.config().absolute_url(&format!("/policies/{handle}"))),
        title: policy.title,
        updated_at: None,
        content_html: policy.body,
    })
}
