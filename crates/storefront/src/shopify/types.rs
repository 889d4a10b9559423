//! Domain types for the Shopify Storefront API.
//!
//! The query documents in `storefront::queries` select exactly the fields
//! these types declare, so responses deserialize straight into them.
//! Connections are requested as `{ nodes }` and flattened into `Vec`s.

use novabox_core::{CurrencyCode, Price, ShopifyGid};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Connection helpers
// =============================================================================

#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

/// Deserialize a `{ nodes: [...] }` connection into a `Vec`.
pub(crate) fn nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Nodes<T>>::deserialize(deserializer)?
        .map(|c| c.nodes)
        .unwrap_or_default())
}

/// Deserialize a nullable list as an empty `Vec`.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code (`MoneyV2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Parse into a typed [`Price`], if the currency is supported.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        Price::parse(&self.amount, &self.currency_code).ok()
    }

    /// Display string, e.g. `$19.99`.
    ///
    /// Currencies without a symbol fall back to `"{amount} {code}"`.
    #[must_use]
    pub fn display(&self) -> String {
        self.price()
            .map_or_else(|| format!("{} {}", self.amount, self.currency_code), |p| p.display())
    }

    /// Whether the amount is zero (or unparseable).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.price().is_none_or(|p| p.is_zero())
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: "0.0".to_owned(),
            currency_code: currency.code().to_owned(),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Price range for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

impl PriceRange {
    /// Whether all variants share one price.
    #[must_use]
    pub fn is_single_price(&self) -> bool {
        self.min_variant_price == self.max_variant_price
    }
}

// =============================================================================
// Image / SEO Types
// =============================================================================

/// Product or collection image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Shopify image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

impl Image {
    /// Alt text, falling back to the given title.
    #[must_use]
    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alt_text.as_deref().filter(|a| !a.is_empty()).unwrap_or(fallback)
    }

    /// Shopify CDN URL resized to the given width.
    #[must_use]
    pub fn sized_url(&self, width: u32) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}width={width}", self.url)
    }
}

/// SEO metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seo {
    /// Page title for search engines.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

impl SelectedOption {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Product option definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    /// Variant ID.
    pub id: String,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// SKU code.
    #[serde(default)]
    pub sku: Option<String>,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    /// Selected options for this variant.
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    #[serde(default)]
    pub image: Option<Image>,
}

impl ProductVariant {
    /// Whether the compare-at price is higher than the price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        match (
            self.price.price(),
            self.compare_at_price.as_ref().and_then(Money::price),
        ) {
            (Some(price), Some(compare)) => compare.amount > price.amount,
            _ => false,
        }
    }
}

/// A product in the store.
///
/// Catalog grids fetch a card-sized subset of fields; everything a card
/// does not select has a serde default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// HTML description.
    #[serde(default)]
    pub description_html: String,
    /// Whether any variant is available.
    #[serde(default)]
    pub available_for_sale: bool,
    /// Vendor name.
    #[serde(default)]
    pub vendor: String,
    /// Product tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// SEO metadata.
    #[serde(default)]
    pub seo: Option<Seo>,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Compare-at price range.
    #[serde(default)]
    pub compare_at_price_range: Option<PriceRange>,
    /// Featured image.
    #[serde(default)]
    pub featured_image: Option<Image>,
    /// All product images.
    #[serde(default, deserialize_with = "nodes")]
    pub images: Vec<Image>,
    /// Product options.
    #[serde(default)]
    pub options: Vec<ProductOption>,
    /// Product variants.
    #[serde(default, deserialize_with = "nodes")]
    pub variants: Vec<ProductVariant>,
    /// Variant matching the requested options, or the first available one.
    #[serde(default)]
    pub selected_or_first_available_variant: Option<ProductVariant>,
}

impl Product {
    /// URL path of the product page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/products/{}", self.handle)
    }

    /// Whether the product has only the implicit "Default Title" variant.
    #[must_use]
    pub fn has_only_default_variant(&self) -> bool {
        self.options.len() == 1
            && self
                .options
                .first()
                .is_some_and(|o| o.values.len() == 1 && o.values.iter().any(|v| v == "Default Title"))
    }
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Collection ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// HTML description.
    #[serde(default)]
    pub description_html: String,
    /// SEO metadata.
    #[serde(default)]
    pub seo: Option<Seo>,
    /// Collection image.
    #[serde(default)]
    pub image: Option<Image>,
    /// One page of products in this collection.
    #[serde(default)]
    pub products: Option<ProductConnection>,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
    /// Cursor for the first item.
    pub start_cursor: Option<String>,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// Cursor pagination request: forward with `after`, backward with `before`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct PageRequest {
    pub after: Option<String>,
    pub before: Option<String>,
}

impl PageRequest {
    /// First page.
    #[must_use]
    pub fn first() -> Self {
        Self::default()
    }

    /// GraphQL `first`/`after`/`last`/`before` variables for a page size.
    #[must_use]
    pub fn variables(&self, page_size: i64) -> PageVariables {
        let before = self.before.clone().filter(|c| !c.is_empty());
        let after = self.after.clone().filter(|c| !c.is_empty());
        if before.is_some() {
            PageVariables {
                first: None,
                after: None,
                last: Some(page_size),
                before,
            }
        } else {
            PageVariables {
                first: Some(page_size),
                after,
                last: None,
                before: None,
            }
        }
    }

    /// Stable cache key fragment.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}",
            self.after.as_deref().unwrap_or(""),
            self.before.as_deref().unwrap_or("")
        )
    }
}

/// Pagination variables shared by every paginated query.
#[derive(Debug, Clone, Serialize)]
pub struct PageVariables {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

/// Paginated list of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnection {
    /// Products in this page.
    #[serde(rename = "nodes")]
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// Paginated list of collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConnection {
    /// Collections in this page.
    #[serde(rename = "nodes")]
    pub collections: Vec<Collection>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Shop / Content Types
// =============================================================================

/// Shop-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub primary_domain: ShopDomain,
}

/// The shop's primary domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopDomain {
    pub url: String,
}

/// An Online Store page managed in Shopify.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPage {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub seo: Option<Seo>,
}

/// A legal policy (privacy, shipping, terms of service, refund).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopPolicy {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub body: String,
    pub url: String,
}

/// A blog article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub content_html: String,
    pub published_at: String,
    #[serde(default, rename = "authorV2")]
    pub author: Option<ArticleAuthor>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub seo: Option<Seo>,
}

/// Article author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleAuthor {
    pub name: String,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: String,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor.
    #[serde(default)]
    pub vendor: String,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Whether available for sale.
    #[serde(default)]
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Compare-at price.
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    /// Selected options.
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    #[serde(default)]
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// Cost for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    #[serde(default)]
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

impl CartLine {
    /// Whether the server has confirmed this line.
    ///
    /// Lines rendered ahead of the server response carry a placeholder id
    /// instead of a `CartLine` GID.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        ShopifyGid::parse(&self.id).is_ok_and(|gid| gid.is("CartLine"))
    }
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    #[serde(default)]
    pub subtotal_amount: Option<Money>,
    /// Total amount.
    pub total_amount: Money,
    /// Total tax amount.
    #[serde(default)]
    pub total_tax_amount: Option<Money>,
}

/// Discount code applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable.
    pub applicable: bool,
}

/// Gift card applied to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedGiftCard {
    pub id: String,
    /// Last four characters of the code.
    pub last_characters: String,
    /// Amount of the card used on this cart.
    pub amount_used: Money,
}

/// Buyer identity for the cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Country code.
    pub country_code: Option<String>,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Checkout URL.
    pub checkout_url: String,
    /// Cart note.
    #[serde(default)]
    pub note: Option<String>,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Buyer identity.
    #[serde(default)]
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Applied discount codes.
    #[serde(default)]
    pub discount_codes: Vec<CartDiscountCode>,
    /// Applied gift cards.
    #[serde(default)]
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    /// Cart lines.
    #[serde(default, deserialize_with = "nodes")]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Discount codes Shopify accepted.
    pub fn applicable_discount_codes(&self) -> impl Iterator<Item = &CartDiscountCode> {
        self.discount_codes.iter().filter(|c| c.applicable)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}

impl CartLineInput {
    #[must_use]
    pub fn new(merchandise_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            merchandise_id: merchandise_id.into(),
            quantity,
        }
    }
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: i64,
}

/// Input for the cart's buyer identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentityInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_access_token: Option<String>,
}

/// User error from cart mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Field path that caused the error.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// Search Types
// =============================================================================

/// Product as returned by predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub tracking_parameters: Option<String>,
    #[serde(default)]
    pub selected_or_first_available_variant: Option<ProductVariant>,
}

/// Collection as returned by predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveCollection {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<Image>,
    pub tracking_parameters: Option<String>,
}

/// Page as returned by predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictivePage {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub tracking_parameters: Option<String>,
}

/// Blog article as returned by predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveArticle {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub blog: ArticleBlog,
    #[serde(default)]
    pub image: Option<Image>,
    pub tracking_parameters: Option<String>,
}

/// Parent blog of an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleBlog {
    pub handle: String,
}

impl ArticleBlog {
    /// URL path of an article in this blog.
    #[must_use]
    pub fn article_url(&self, article_handle: &str) -> String {
        format!("/blogs/{}/{article_handle}", self.handle)
    }
}

/// Query suggestion as returned by predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveQuery {
    pub text: String,
    pub styled_text: String,
    pub tracking_parameters: Option<String>,
}

/// Raw predictive search payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictiveSearchResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub articles: Vec<PredictiveArticle>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub collections: Vec<PredictiveCollection>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pages: Vec<PredictivePage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products: Vec<PredictiveProduct>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub queries: Vec<PredictiveQuery>,
}

/// One hit on the full search page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum SearchHit {
    Product(Box<Product>),
    Page {
        handle: String,
        title: String,
    },
    Article {
        handle: String,
        title: String,
        blog: ArticleBlog,
    },
}

/// A page of full search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub total_count: i64,
    pub nodes: Vec<SearchHit>,
    pub page_info: PageInfo,
}
