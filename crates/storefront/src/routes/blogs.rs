//! Blog article route handler.
//!
//! Predictive and full search link articles here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;
use crate::views::{ImageView, Layout};

/// Article page template.
#[derive(Template, WebTemplate)]
#[template(path = "blogs/article.html")]
pub struct ArticleTemplate {
    pub layout: Layout,
    pub blog_title: String,
    pub title: String,
    pub author: Option<String>,
    pub published: Option<String>,
    pub image: Option<ImageView>,
    pub content_html: String,
}

/// Long date for an RFC 3339 timestamp (`January 5, 2025`).
fn published_date(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).format("%B %-d, %Y").to_string())
}

/// Display a blog article.
#[instrument(skip(state, nonce))]
pub async fn article(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path((blog, handle)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (blog_title, article) = state.storefront().get_article(&blog, &handle).await?;
    let seo = article.seo.clone().unwrap_or_default();

    Ok(ArticleTemplate {
        layout: Layout::new(
            &state,
            nonce,
            seo.title.as_deref().unwrap_or(&article.title),
        )
        .with_description(seo.description.unwrap_or_default())
        .with_canonical(
            state
                .config()
                .absolute_url(&format!("/blogs/{blog}/{}", article.handle)),
        ),
        blog_title,
        author: article.author.map(|a| a.name),
        published: published_date(&article.published_at),
        image: article
            .image
            .as_ref()
            .map(|img| ImageView::sized(img, &article.title, 1200)),
        title: article.title,
        content_html: article.content_html,
    })
}
