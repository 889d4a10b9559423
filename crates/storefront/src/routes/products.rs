//! Product route handlers.

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
use crate::shopify::types::{Product, ProductVariant};
use crate::state::AppState;
use crate::variants::{self, OptionState};
use crate::views::{ImageView, Layout, ProductCardView};

/// Product detail display data.
#[derive(Clone)]
pub struct ProductView {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub description_html: String,
    pub images: Vec<ImageView>,
    /// Option pickers; empty for products with only the default variant.
    pub options: Vec<OptionState>,
}

/// The variant the page is showing.
#[derive(Clone)]
pub struct SelectedVariantView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub available: bool,
    pub image: Option<ImageView>,
}

impl SelectedVariantView {
    fn new(variant: &ProductVariant, product_title: &str) -> Self {
        Self {
            id: variant.id.clone(),
            title: variant.title.clone(),
            price: variant.price.display(),
            compare_at_price: variant
                .compare_at_price
                .as_ref()
                .filter(|_| variant.is_on_sale())
                .map(crate::shopify::Money::display),
            available: variant.available_for_sale,
            image: variant
                .image
                .as_ref()
                .map(|img| ImageView::sized(img, product_title, 1200)),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub variant: Option<SelectedVariantView>,
    pub recommendations: Vec<ProductCardView>,
}

fn product_view(product: &Product, options: Vec<OptionState>) -> ProductView {
    let images = if product.images.is_empty() {
        product
            .featured_image
            .iter()
            .map(|img| ImageView::sized(img, &product.title, 1200))
            .collect()
    } else {
        product
            .images
            .iter()
            .map(|img| ImageView::sized(img, &product.title, 1200))
            .collect()
    };

    ProductView {
        handle: product.handle.clone(),
        title: product.title.clone(),
        vendor: product.vendor.clone(),
        description_html: product.description_html.clone(),
        images,
        options: if product.has_only_default_variant() {
            Vec::new()
        } else {
            options
        },
    }
}

/// Display product detail page.
///
/// The query string selects options (`?Color=Blue&Size=M`); unknown keys are
/// ignored and an impossible combination falls back to the first available
/// variant.
#[instrument(skip(state, nonce, query))]
pub async fn show(
    State(state): State<AppState>,
    nonce: CspNonce,
    Path(handle): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.storefront().get_product_by_handle(&handle).await?;

    let requested = variants::selected_options_from_query(&query, &product.options);
    let variant = variants::find_variant(&product.variants, &requested)
        .or(product.selected_or_first_available_variant.as_ref());
    let selected = variant.map(|v| v.selected_options.clone()).unwrap_or_default();

    let recommendations = state
        .storefront()
        .get_product_recommendations(&product.id)
        .await
        .map_or_else(
            |e| {
                tracing::warn!("Failed to fetch recommendations for {handle}: {e}");
                Vec::new()
            },
            |products| products.iter().take(4).map(ProductCardView::from).collect(),
        );

    let seo = product.seo.clone().unwrap_or_default();
    let layout = Layout::new(
        &state,
        nonce,
        seo.title.as_deref().unwrap_or(&product.title),
    )
    .with_description(seo.description.unwrap_or_else(|| product.description.clone()))
    .with_canonical(state.config().absolute_url(&product.url()));

    Ok(ProductShowTemplate {
        layout,
        variant: variant.map(|v| SelectedVariantView::new(v, &product.title)),
        product: product_view(&product, variants::option_value_states(&product, &selected)),
        recommendations,
    })
}
