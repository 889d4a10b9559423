//! Crawler-facing routes: `robots.txt` and the XML sitemap.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::instrument;

use crate::filters;
use crate::shopify::types::PageRequest;
use crate::state::AppState;

/// `Cache-Control` for crawler documents.
const CRAWLER_CACHE: &str = "max-age=86400";

/// Collections listed in the sitemap.
const SITEMAP_COLLECTIONS: i64 = 250;

/// Paths always present in the sitemap.
const STATIC_PATHS: &[&str] = &[
    "/",
    "/collections",
    "/collections/all",
    "/about",
    "/services",
    "/contact",
    "/policies",
];

/// One `<url>` entry.
#[derive(Clone)]
pub struct SitemapEntry {
    pub loc: String,
}

/// Sitemap XML template.
#[derive(Template, WebTemplate)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub entries: Vec<SitemapEntry>,
}

/// Body of `robots.txt` for a site rooted at `base_url`.
fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /cart\n\
         Disallow: /account\n\
         Disallow: /checkout\n\
         Disallow: /search\n\
         \n\
         Sitemap: {base_url}/sitemap.xml\n"
    )
}

/// Serve `robots.txt`.
#[instrument(skip(state))]
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, CRAWLER_CACHE),
        ],
        robots_txt(&state.config().base_url),
    )
}

/// Serve the sitemap.
///
/// Lists static pages, markdown marketing pages and the first page of
/// products and collections. Catalog failures shrink the sitemap rather than
/// failing it.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config();
    let first = PageRequest::first();

    let mut paths: Vec<String> = STATIC_PATHS.iter().map(|p| (*p).to_owned()).collect();

    paths.extend(
        state
            .content()
            .slugs()
            .into_iter()
            // Checkout return pages are not for crawlers; aliases are already listed
            .filter(|slug| {
                !slug.starts_with("stripe-") && !STATIC_PATHS.contains(&format!("/{slug}").as_str())
            })
            .map(|slug| format!("/pages/{slug}")),
    );

    match state.storefront().get_products(&first).await {
        Ok(products) => paths.extend(products.products.iter().map(|p| p.url())),
        Err(e) => tracing::warn!("Sitemap: failed to fetch products: {e}"),
    }

    match state
        .storefront()
        .get_collections(&first, SITEMAP_COLLECTIONS)
        .await
    {
        Ok(collections) => paths.extend(
            collections
                .collections
                .iter()
                .map(|c| format!("/collections/{}", c.handle)),
        ),
        Err(e) => tracing::warn!("Sitemap: failed to fetch collections: {e}"),
    }

    (
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, CRAWLER_CACHE),
        ],
        SitemapTemplate {
            entries: paths
                .iter()
                .map(|path| SitemapEntry {
                    loc: config.absolute_url(path),
                })
                .collect(),
        },
    )
}

/// Old per-type sitemap pages now live in the single sitemap.
#[instrument]
pub async fn legacy_sitemap(Path((kind, page)): Path<(String, String)>) -> impl IntoResponse {
    tracing::debug!(%kind, %page, "Redirecting legacy sitemap");
    (
        StatusCode::MOVED_PERMANENTLY,
        [
            (header::LOCATION, "/sitemap.xml"),
            (header::CACHE_CONTROL, CRAWLER_CACHE),
        ],
    )
}
