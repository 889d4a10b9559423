//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` query types with `reqwest` 0.13 for HTTP.
//! Caches catalog reads using `moka` (5-minute TTL). Cart operations are
//! never cached.

mod cache;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Article, Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, Collection,
    CollectionConnection, PageRequest, PredictiveSearchResult, Product, ProductConnection,
    SearchResults, Shop, ShopPage, ShopPolicy,
};

use cache::{CacheValue, collection_prefix, product_key};
use queries::{
    ArticleVariables, CartBuyerIdentityUpdate, CartBuyerIdentityVariables, CartCreate, CartCreateVariables,
    CartDiscountCodesUpdate, CartDiscountCodesVariables, CartGiftCardCodesUpdate,
    CartGiftCardCodesVariables, CartIdVariables, CartInput, CartLinesAdd, CartLinesAddVariables,
    CartLinesRemove, CartLinesRemoveVariables, CartLinesUpdate, CartLinesUpdateVariables,
    CartMutation, CartNoteUpdate, CartNoteVariables, GetArticle, GetCart, GetCollectionByHandle,
    GetCollections, GetPage, GetPolicies, GetProductByHandle, GetProductRecommendations,
    GetProducts, GetShop, HandlePageVariables, HandleVariables, NoVariables, PredictiveSearch,
    PredictiveSearchVariables, ProductVariables, RecommendationVariables, Search,
    SearchVariables,
};

/// Products per page on catalog and collection pages.
pub const CATALOG_PAGE_SIZE: i64 = 12;

/// Results per page on the full search page.
pub const SEARCH_PAGE_SIZE: i64 = 8;

/// Result types predictive search asks for.
pub const PREDICTIVE_SEARCH_TYPES: [&str; 5] = ["ARTICLE", "COLLECTION", "PAGE", "PRODUCT", "QUERY"];

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides type-safe access to the catalog, content, search and cart.
/// Catalog and content reads are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self::with_endpoint(endpoint, config.storefront_private_token.expose_secret())
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token: access_token.to_owned(),
                cache,
            }),
        }
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(Into::into).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    /// Run a cart mutation and unwrap its `{ cart, userErrors }` payload.
    async fn mutate_cart<Q: CartMutation>(
        &self,
        variables: Q::Variables,
    ) -> Result<Cart, ShopifyError> {
        let data = self.execute::<Q>(variables).await?;

        if let Some(payload) = Q::payload(data) {
            if !payload.user_errors.is_empty() {
                return Err(ShopifyError::UserError(
                    payload
                        .user_errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join("; "),
                ));
            }

            if let Some(cart) = payload.cart {
                return Ok(cart);
            }
        }

        Err(ShopifyError::message(Q::FAILURE))
    }

    async fn cached(&self, key: &str) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(key, "Cache hit");
        }
        hit
    }

    async fn store(&self, key: String, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    // =========================================================================
    // Shop
    // =========================================================================

    /// Get shop metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_shop(&self) -> Result<Shop, ShopifyError> {
        const KEY: &str = "shop";
        if let Some(CacheValue::Shop(shop)) = self.cached(KEY).await {
            return Ok(*shop);
        }

        let data = self.execute::<GetShop>(NoVariables {}).await?;
        self.store(KEY.to_owned(), CacheValue::Shop(Box::new(data.shop.clone())))
            .await;
        Ok(data.shop)
    }

    /// Check the API answers at all. Never served from cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn ping(&self) -> Result<(), ShopifyError> {
        self.execute::<GetShop>(NoVariables {}).await.map(|_| ())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle with all of its variants.
    ///
    /// Cached per handle; callers resolve the selected variant locally.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has the handle, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = product_key(handle);

        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(ProductVariables {
                handle: handle.to_owned(),
            })
            .await?;

        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.store(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get one page of the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, page: &PageRequest) -> Result<ProductConnection, ShopifyError> {
        let cache_key = format!("products:{}", page.cache_key());

        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(page.variables(CATALOG_PAGE_SIZE))
            .await?;

        self.store(cache_key, CacheValue::Products(data.products.clone()))
            .await;
        Ok(data.products)
    }

    /// Get products related to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<Product>, ShopifyError> {
        let cache_key = format!("recommendations:{product_id}");

        if let Some(CacheValue::Recommendations(products)) = self.cached(&cache_key).await {
            return Ok(products);
        }

        let data = self
            .execute::<GetProductRecommendations>(RecommendationVariables {
                product_id: product_id.to_owned(),
            })
            .await?;

        let products = data.product_recommendations.unwrap_or_default();
        self.store(cache_key, CacheValue::Recommendations(products.clone()))
            .await;
        Ok(products)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection with one page of its products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no collection has the handle, or an error if the
    /// API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        page: &PageRequest,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = format!("{}{}", collection_prefix(handle), page.cache_key());

        if let Some(CacheValue::Collection(collection)) = self.cached(&cache_key).await {
            return Ok(*collection);
        }

        let data = self
            .execute::<GetCollectionByHandle>(HandlePageVariables {
                handle: handle.to_owned(),
                page: page.variables(CATALOG_PAGE_SIZE),
            })
            .await?;

        let collection = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.store(cache_key, CacheValue::Collection(Box::new(collection.clone())))
            .await;
        Ok(collection)
    }

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        page: &PageRequest,
        page_size: i64,
    ) -> Result<CollectionConnection, ShopifyError> {
        let cache_key = format!("collections:{page_size}:{}", page.cache_key());

        if let Some(CacheValue::Collections(collections)) = self.cached(&cache_key).await {
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(page.variables(page_size))
            .await?;

        self.store(cache_key, CacheValue::Collections(data.collections.clone()))
            .await;
        Ok(data.collections)
    }

    // =========================================================================
    // Content Methods
    // =========================================================================

    /// Get an Online Store page by handle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the page does not exist, or an error if the API
    /// request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_page(&self, handle: &str) -> Result<ShopPage, ShopifyError> {
        let cache_key = format!("page:{handle}");

        if let Some(CacheValue::Page(page)) = self.cached(&cache_key).await {
            return Ok(*page);
        }

        let data = self
            .execute::<GetPage>(HandleVariables {
                handle: handle.to_owned(),
            })
            .await?;

        let page = data
            .page
            .ok_or_else(|| ShopifyError::NotFound(format!("Page not found: {handle}")))?;

        self.store(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;
        Ok(page)
    }

    /// Get a blog article, with its blog's title.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the blog or article does not exist, or an error
    /// if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_article(
        &self,
        blog_handle: &str,
        article_handle: &str,
    ) -> Result<(String, Article), ShopifyError> {
        let cache_key = format!("article:{blog_handle}:{article_handle}");

        if let Some(CacheValue::Article(entry)) = self.cached(&cache_key).await {
            return Ok(*entry);
        }

        let data = self
            .execute::<GetArticle>(ArticleVariables {
                blog_handle: blog_handle.to_owned(),
                article_handle: article_handle.to_owned(),
            })
            .await?;

        let entry = data
            .blog
            .and_then(|blog| Some((blog.title, blog.article_by_handle?)))
            .ok_or_else(|| {
                ShopifyError::NotFound(format!("Article not found: {blog_handle}/{article_handle}"))
            })?;

        self.store(cache_key, CacheValue::Article(Box::new(entry.clone())))
            .await;
        Ok(entry)
    }

    /// Get every configured legal policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_policies(&self) -> Result<Vec<ShopPolicy>, ShopifyError> {
        const KEY: &str = "policies";
        if let Some(CacheValue::Policies(policies)) = self.cached(KEY).await {
            return Ok(policies);
        }

        let data = self.execute::<GetPolicies>(NoVariables {}).await?;
        let policies = data.shop.into_vec();
        self.store(KEY.to_owned(), CacheValue::Policies(policies.clone()))
            .await;
        Ok(policies)
    }

    /// Get one policy by handle (e.g. `privacy-policy`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no configured policy has the handle.
    pub async fn get_policy(&self, handle: &str) -> Result<ShopPolicy, ShopifyError> {
        self.get_policies()
            .await?
            .into_iter()
            .find(|p| p.handle == handle)
            .ok_or_else(|| ShopifyError::NotFound(format!("Policy not found: {handle}")))
    }

    // =========================================================================
    // Search Methods (not cached)
    // =========================================================================

    /// Typeahead search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn predictive_search(
        &self,
        term: &str,
        limit: i64,
    ) -> Result<PredictiveSearchResult, ShopifyError> {
        let data = self
            .execute::<PredictiveSearch>(PredictiveSearchVariables {
                term: term.to_owned(),
                limit,
                types: PREDICTIVE_SEARCH_TYPES.to_vec(),
            })
            .await?;

        Ok(data.predictive_search.unwrap_or_default())
    }

    /// Full search results page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        term: &str,
        page: &PageRequest,
    ) -> Result<SearchResults, ShopifyError> {
        let data = self
            .execute::<Search>(SearchVariables {
                term: term.to_owned(),
                page: page.variables(SEARCH_PAGE_SIZE),
            })
            .await?;

        Ok(data.search)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines, buyer_identity))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_identity: Option<CartBuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartCreate>(CartCreateVariables {
            input: CartInput {
                lines,
                buyer_identity,
            },
        })
        .await
    }

    /// Get an existing cart.
    ///
    /// Returns `Ok(None)` when the cart no longer exists (completed or expired).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError> {
        let data = self
            .execute::<GetCart>(CartIdVariables {
                cart_id: cart_id.to_owned(),
            })
            .await?;

        Ok(data.cart)
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartLinesAdd>(CartLinesAddVariables {
            cart_id: cart_id.to_owned(),
            lines,
        })
        .await
    }

    /// Update quantities of cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartLinesUpdate>(CartLinesUpdateVariables {
            cart_id: cart_id.to_owned(),
            lines,
        })
        .await
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartLinesRemove>(CartLinesRemoveVariables {
            cart_id: cart_id.to_owned(),
            line_ids,
        })
        .await
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, discount_codes), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &str,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartDiscountCodesUpdate>(CartDiscountCodesVariables {
            cart_id: cart_id.to_owned(),
            discount_codes,
        })
        .await
    }

    /// Replace the gift card codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, gift_card_codes), fields(cart_id = %cart_id))]
    pub async fn update_gift_card_codes(
        &self,
        cart_id: &str,
        gift_card_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartGiftCardCodesUpdate>(CartGiftCardCodesVariables {
            cart_id: cart_id.to_owned(),
            gift_card_codes,
        })
        .await
    }

    /// Update cart note.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, note), fields(cart_id = %cart_id))]
    pub async fn update_note(&self, cart_id: &str, note: &str) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartNoteUpdate>(CartNoteVariables {
            cart_id: cart_id.to_owned(),
            note: note.to_owned(),
        })
        .await
    }

    /// Update the cart's buyer identity (country, logged-in customer).
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, buyer_identity), fields(cart_id = %cart_id))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        buyer_identity: CartBuyerIdentityInput,
    ) -> Result<Cart, ShopifyError> {
        self.mutate_cart::<CartBuyerIdentityUpdate>(CartBuyerIdentityVariables {
            cart_id: cart_id.to_owned(),
            buyer_identity,
        })
        .await
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner.cache.invalidate(&product_key(handle)).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
