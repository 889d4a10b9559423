//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::search::{PREDICTIVE_SEARCH_LIMIT, PredictiveResults};
use crate::shopify::types::{PageRequest, SearchHit};
use crate::state::AppState;
use crate::views::{Layout, PaginationView, ProductCardView};

/// Predictive search query parameters.
#[derive(Debug, Deserialize)]
pub struct PredictiveQuery {
    #[serde(default)]
    pub q: String,
}

/// Full search page query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchPageQuery {
    #[serde(default)]
    pub q: String,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Non-product hit on the search page.
#[derive(Clone)]
pub struct SearchLinkView {
    pub title: String,
    pub url: String,
    pub kind: &'static str,
}

/// Predictive search dropdown (htmx fragment).
#[derive(Template, WebTemplate)]
#[template(path = "partials/predictive_search.html")]
pub struct PredictiveSearchTemplate {
    pub results: PredictiveResults,
    pub view_all_url: String,
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchPageTemplate {
    pub layout: Layout,
    pub query: String,
    pub total_count: i64,
    pub products: Vec<ProductCardView>,
    pub links: Vec<SearchLinkView>,
    pub pagination: PaginationView,
}

/// Predictive search endpoint (htmx).
///
/// Blank terms render an empty fragment without calling Shopify. Failures
/// degrade to the no-results state.
#[instrument(skip(state))]
pub async fn predictive(
    State(state): State<AppState>,
    Query(query): Query<PredictiveQuery>,
) -> impl IntoResponse {
    let term = query.q.trim();

    let results = if term.is_empty() {
        PredictiveResults::empty(term)
    } else {
        match state
            .storefront()
            .predictive_search(term, PREDICTIVE_SEARCH_LIMIT)
            .await
        {
            Ok(result) => PredictiveResults::from_api(term, result),
            Err(e) => {
                tracing::warn!("Predictive search failed for {term:?}: {e}");
                PredictiveResults::empty(term)
            }
        }
    };

    PredictiveSearchTemplate {
        view_all_url: format!("/search?q={}", urlencoding::encode(term)),
        results,
    }
}

/// Full search page.
#[instrument(skip(state, nonce))]
pub async fn index(
    State(state): State<AppState>,
    nonce: CspNonce,
    Query(query): Query<SearchPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let term = query.q.trim().to_owned();
    let layout = Layout::new(&state, nonce, "Search");

    if term.is_empty() {
        return Ok(SearchPageTemplate {
            layout,
            query: term,
            total_count: 0,
            products: Vec::new(),
            links: Vec::new(),
            pagination: PaginationView::default(),
        });
    }

    let results = state.storefront().search(&term, &query.page).await?;

    let mut products = Vec::new();
    let mut links = Vec::new();
    for hit in &results.nodes {
        match hit {
            SearchHit::Product(product) => products.push(ProductCardView::from(product.as_ref())),
            SearchHit::Page { handle, title } => links.push(SearchLinkView {
                title: title.clone(),
                url: format!("/pages/{handle}"),
                kind: "Page",
            }),
            SearchHit::Article {
                handle,
                title,
                blog,
            } => links.push(SearchLinkView {
                title: title.clone(),
                url: blog.article_url(handle),
                kind: "Article",
            }),
        }
    }

    let extra = format!("q={}", urlencoding::encode(&term));
    Ok(SearchPageTemplate {
        layout: layout.with_description(format!("Search results for \"{term}\"")),
        pagination: PaginationView::from_page_info(&results.page_info, "/search", &extra),
        total_count: results.total_count,
        query: term,
        products,
        links,
    })
}
