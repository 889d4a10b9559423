//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::shopify::{PageRequest, ShopifyError};
use crate::state::AppState;
use crate::views::{ImageView, Layout, ProductCardView};

/// Collection featured under the hero.
const FEATURED_COLLECTION: &str = "frontpage";

/// Products in the recommended grid.
const RECOMMENDED_COUNT: usize = 4;

/// Environment map lighting the hero scene, served by `/assets/env/{file}`.
pub const HERO_ENVIRONMENT_MAP: &str = "studio_small_03_1k.hdr";

/// Featured collection banner.
#[derive(Clone)]
pub struct FeaturedCollectionView {
    pub title: String,
    pub url: String,
    pub image: Option<ImageView>,
    pub products: Vec<ProductCardView>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub environment_map_url: String,
    pub featured: Option<FeaturedCollectionView>,
    pub recommended: Vec<ProductCardView>,
}

/// Display the home page.
///
/// Catalog failures degrade to an empty section rather than an error page.
#[instrument(skip(state, nonce))]
pub async fn home(State(state): State<AppState>, nonce: CspNonce) -> impl IntoResponse {
    let storefront = state.storefront();
    let first_page = PageRequest::first();

    let featured = match storefront
        .get_collection_by_handle(FEATURED_COLLECTION, &first_page)
        .await
    {
        Ok(collection) => Some(FeaturedCollectionView {
            url: format!("/collections/{}", collection.handle),
            image: collection
                .image
                .as_ref()
                .map(|img| ImageView::sized(img, &collection.title, 1600)),
            products: collection
                .products
                .as_ref()
                .map(|c| c.products.iter().map(ProductCardView::from).collect())
                .unwrap_or_default(),
            title: collection.title,
        }),
        Err(ShopifyError::NotFound(_)) => None,
        Err(e) => {
            tracing::error!("Failed to fetch featured collection: {e}");
            None
        }
    };

    let recommended = storefront.get_products(&first_page).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch recommended products: {e}");
            Vec::new()
        },
        |page| {
            page.products
                .iter()
                .take(RECOMMENDED_COUNT)
                .map(ProductCardView::from)
                .collect()
        },
    );

    // Without a featured collection the newest products fill the banner
    let featured = featured.or_else(|| {
        (!recommended.is_empty()).then(|| FeaturedCollectionView {
            title: "New Arrivals".to_owned(),
            url: "/collections/all".to_owned(),
            image: None,
            products: recommended.clone(),
        })
    });

    HomeTemplate {
        layout: Layout::new(&state, nonce, "")
            .with_description("Novabox: objects for the modern desk."),
        environment_map_url: format!("/assets/env/{HERO_ENVIRONMENT_MAP}"),
        featured,
        recommended,
    }
}
