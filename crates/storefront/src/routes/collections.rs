//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::shopify::types::{Collection, PageRequest};
use crate::state::AppState;
use crate::views::{ImageView, Layout, PaginationView, ProductCardView};

/// Collections shown on the collection grid.
const COLLECTIONS_PAGE_SIZE: i64 = 24;

/// Collection card display data.
#[derive(Clone)]
pub struct CollectionCardView {
    pub title: String,
    pub url: String,
    pub image: Option<ImageView>,
}

impl From<&Collection> for CollectionCardView {
    fn from(collection: &Collection) -> Self {
        Self {
            title: collection.title.clone(),
            url: format!("/collections/{}", collection.handle),
            image: collection
                .image
                .as_ref()
                .map(|img| ImageView::sized(img, &collection.title, 800)),
        }
    }
}

/// Collection grid template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub layout: Layout,
    pub collections: Vec<CollectionCardView>,
    pub pagination: PaginationView,
}

/// Product grid template for `/collections/all` and single collections.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub layout: Layout,
    pub title: String,
    pub description_html: String,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
}

/// Display the collection grid.
#[instrument(skip(state, nonce))]
pub async fn index(
    State(state): State<AppState>,
    nonce: CspNonce,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let connection = state
        .storefront()
        .get_collections(&page, COLLECTIONS_PAGE_SIZE)
        .await?;

    Ok(CollectionsIndexTemplate {
        layout: Layout::new(&state, nonce, "Collections"),
        collections: connection
            .collections
            .iter()
            .map(CollectionCardView::from)
            .collect(),
        pagination: PaginationView::from_page_info(&connection.page_info, "/collections", ""),
    })
}

/// Display every product in the catalog.
#[instrument(skip(state, nonce))]
pub async fn all(
    State(state): State<AppState>,
    nonce: CspNonce,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let connection = state.storefront().get_products(&page).await?;

    Ok(CollectionShowTemplate {
        layout: Layout::new(&state, nonce, "All Products")
            .with_canonical(state.config().absolute_url("/collections/all")),
        title: "All Products".to_owned(),
        description_html: String::new(),
        products: connection
            .products
            .iter()
            .map(ProductCardView::from)
            .collect(),
        pagination: PaginationView::from_page_info(
            &connection.page_info,
            "/collections/all",
            "",
        ),
    })
}

/// Display a collection's products.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path(handle): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, &page)
        .await?;

    let base_path = format!("/collections/{}", collection.handle);
    let (products, pagination) = collection.products.as_ref().map_or_else(
        || (Vec::new(), PaginationView::default()),
        |c| {
            (
                c.products.iter().map(ProductCardView::from).collect(),
                PaginationView::from_page_info(&c.page_info, &base_path, ""),
            )
        },
    );

    let seo = collection.seo.clone().unwrap_or_default();
    let layout = Layout::new(
        &state,
        nonce,
        seo.title.as_deref().unwrap_or(&collection.title),
    )
    .with_description(
        seo.description
            .unwrap_or_else(|| collection.description.clone()),
    )
    .with_canonical(state.config().absolute_url(&base_path));

    Ok(CollectionShowTemplate {
        layout,
        title: collection.title,
        description_html: collection.description_html,
        products,
        pagination,
    })
}
