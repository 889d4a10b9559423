//! Cache types for Storefront API responses.

use crate::shopify::types::{
    Article, Collection, CollectionConnection, Product, ProductConnection, Shop, ShopPage, ShopPolicy,
};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Shop(Box<Shop>),
    Product(Box<Product>),
    Products(ProductConnection),
    Recommendations(Vec<Product>),
    Collection(Box<Collection>),
    Collections(CollectionConnection),
    Page(Box<ShopPage>),
    Article(Box<(String, Article)>),
    Policies(Vec<ShopPolicy>),
}

/// Cache key for a product detail page.
pub fn product_key(handle: &str) -> String {
    format!("product:{handle}")
}

/// Cache key prefix for a collection; the page cursor is appended.
pub fn collection_prefix(handle: &str) -> String {
    format!("collection:{handle}:")
}
