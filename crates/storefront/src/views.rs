//! View models shared by templates.
//!
//! Templates never see raw Shopify types; handlers convert API responses into
//! these display structs first.

use crate::config::AnalyticsConfig;
use crate::middleware::CspNonce;
use crate::shopify::types::{Image, Money, PageInfo, Product};
use crate::state::AppState;

/// Site name used in titles and meta tags.
pub const SITE_NAME: &str = "Novabox";

/// Data every full page needs for `base.html`.
#[derive(Clone)]
pub struct Layout {
    pub title: String,
    pub description: String,
    pub canonical_url: Option<String>,
    pub nonce: String,
    pub analytics: AnalyticsConfig,
}

impl Layout {
    /// Layout for a page titled `title`.
    #[must_use]
    pub fn new(state: &AppState, nonce: CspNonce, title: &str) -> Self {
        Self {
            title: page_title(title),
            description: String::new(),
            canonical_url: None,
            nonce: nonce.0,
            analytics: state.config().analytics.clone(),
        }
    }

    /// Layout without request context (error pages).
    #[must_use]
    pub fn bare(title: &str) -> Self {
        Self {
            title: page_title(title),
            description: String::new(),
            canonical_url: None,
            nonce: String::new(),
            analytics: AnalyticsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_canonical(mut self, url: String) -> Self {
        self.canonical_url = Some(url);
        self
    }
}

fn page_title(title: &str) -> String {
    if title.is_empty() || title == SITE_NAME {
        SITE_NAME.to_owned()
    } else {
        format!("{title} | {SITE_NAME}")
    }
}

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ImageView {
    /// Build from a Shopify image, resized for `width` CSS pixels.
    #[must_use]
    pub fn sized(image: &Image, fallback_alt: &str, width: u32) -> Self {
        Self {
            url: image.sized_url(width),
            alt: image.alt_or(fallback_alt).to_owned(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Product card in grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub handle: String,
    pub title: String,
    pub url: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub available: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let price = &product.price_range.min_variant_price;
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            url: product.url(),
            price: price.display(),
            compare_at_price: product
                .compare_at_price_range
                .as_ref()
                .map(|r| &r.min_variant_price)
                .filter(|c| is_higher(c, price))
                .map(Money::display),
            image: product
                .featured_image
                .as_ref()
                .map(|img| ImageView::sized(img, &product.title, 600)),
            available: product.available_for_sale,
        }
    }
}

/// Whether `compare` is a real markdown from `price`.
fn is_higher(compare: &Money, price: &Money) -> bool {
    match (compare.price(), price.price()) {
        (Some(c), Some(p)) => c.amount > p.amount,
        _ => false,
    }
}

/// Previous/next links for cursor pagination.
#[derive(Clone, Default)]
pub struct PaginationView {
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationView {
    /// Links for `base_path`, keeping `extra` query pairs (already encoded).
    #[must_use]
    pub fn from_page_info(page_info: &PageInfo, base_path: &str, extra: &str) -> Self {
        let link = |key: &str, cursor: &str| {
            let mut url = format!("{base_path}?{key}={}", urlencoding::encode(cursor));
            if !extra.is_empty() {
                url.push('&');
                url.push_str(extra);
            }
            url
        };

        Self {
            previous_url: page_info
                .start_cursor
                .as_deref()
                .filter(|_| page_info.has_previous_page)
                .map(|c| link("before", c)),
            next_url: page_info
                .end_cursor
                .as_deref()
                .filter(|_| page_info.has_next_page)
                .map(|c| link("after", c)),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.previous_url.is_none() && self.next_url.is_none()
    }
}
