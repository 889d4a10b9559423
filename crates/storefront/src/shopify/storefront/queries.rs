//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation is a marker type implementing [`GraphQLQuery`] with its
//! query document, variables and response shape. Response types are the
//! domain types from [`crate::shopify::types`]; fragments select exactly the
//! fields those types declare.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{
    Article, Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, CartUserError, Collection,
    CollectionConnection, PageVariables, PredictiveSearchResult, Product, ProductConnection,
    SearchResults, Shop, ShopPage, ShopPolicy,
};

/// Declare a marker type implementing `GraphQLQuery`.
macro_rules! graphql_operation {
    ($(#[$meta:meta])* $name:ident, $op:expr, $vars:ty, $data:ty, $doc:expr $(,)?) => {
        $(#[$meta])*
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $doc,
                    operation_name: $op,
                }
            }
        }
    };
}

// =============================================================================
// Fragments
// =============================================================================

macro_rules! money_fields {
    () => {
        "amount currencyCode"
    };
}

macro_rules! image_fields {
    () => {
        "id url altText width height"
    };
}

macro_rules! product_card_fragment {
    () => {
        concat!(
            "fragment ProductCard on Product {
                id handle title availableForSale
                featuredImage { ", image_fields!(), " }
                priceRange {
                    minVariantPrice { ", money_fields!(), " }
                    maxVariantPrice { ", money_fields!(), " }
                }
                compareAtPriceRange {
                    minVariantPrice { ", money_fields!(), " }
                    maxVariantPrice { ", money_fields!(), " }
                }
            }"
        )
    };
}

macro_rules! variant_fragment {
    () => {
        concat!(
            "fragment ProductVariantFields on ProductVariant {
                id title availableForSale sku
                price { ", money_fields!(), " }
                compareAtPrice { ", money_fields!(), " }
                selectedOptions { name value }
                image { ", image_fields!(), " }
            }"
        )
    };
}

macro_rules! cart_fragment {
    () => {
        concat!(
            "fragment CartFields on Cart {
                id checkoutUrl totalQuantity note
                buyerIdentity { countryCode email }
                cost {
                    subtotalAmount { ", money_fields!(), " }
                    totalAmount { ", money_fields!(), " }
                    totalTaxAmount { ", money_fields!(), " }
                }
                discountCodes { code applicable }
                appliedGiftCards { id lastCharacters amountUsed { ", money_fields!(), " } }
                lines(first: 100) {
                    nodes {
                        id quantity
                        cost {
                            amountPerQuantity { ", money_fields!(), " }
                            compareAtAmountPerQuantity { ", money_fields!(), " }
                            totalAmount { ", money_fields!(), " }
                        }
                        merchandise {
                            ... on ProductVariant {
                                id title availableForSale
                                price { ", money_fields!(), " }
                                compareAtPrice { ", money_fields!(), " }
                                selectedOptions { name value }
                                image { ", image_fields!(), " }
                                product { id handle title vendor }
                            }
                        }
                    }
                }
            }"
        )
    };
}

macro_rules! cart_mutation_payload {
    () => {
        "cart { ...CartFields } userErrors { code field message }"
    };
}

macro_rules! page_info_fields {
    () => {
        "pageInfo { hasNextPage hasPreviousPage startCursor endCursor }"
    };
}

// =============================================================================
// Shared variable / response types
// =============================================================================

/// Variables for operations that take none.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoVariables {}

/// Variables carrying only a handle.
#[derive(Debug, Clone, Serialize)]
pub struct HandleVariables {
    pub handle: String,
}

/// Variables carrying a handle plus a page of a nested connection.
#[derive(Debug, Clone, Serialize)]
pub struct HandlePageVariables {
    pub handle: String,
    #[serde(flatten)]
    pub page: PageVariables,
}

/// The `{ cart, userErrors }` payload every cart mutation returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<Cart>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

/// A cart mutation: knows where its payload lives in the response.
pub trait CartMutation: GraphQLQuery {
    /// Message used when the payload has neither a cart nor user errors.
    const FAILURE: &'static str;

    fn payload(data: Self::ResponseData) -> Option<CartMutationPayload>;
}

// =============================================================================
// Shop
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ShopData {
    pub shop: Shop,
}

graphql_operation!(
    /// Shop name, description and primary domain.
    GetShop,
    "GetShop",
    NoVariables,
    ShopData,
    "query GetShop { shop { name description primaryDomain { url } } }",
);

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariables {
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: Option<Product>,
}

graphql_operation!(
    /// Product detail with every variant and the first available one.
    GetProductByHandle,
    "GetProductByHandle",
    ProductVariables,
    ProductData,
    concat!(
        "query GetProductByHandle($handle: String!) {
            product(handle: $handle) {
                ...ProductCard
                description descriptionHtml vendor tags
                seo { title description }
                images(first: 20) { nodes { ", image_fields!(), " } }
                options(first: 10) { name values }
                variants(first: 250) { nodes { ...ProductVariantFields } }
                selectedOrFirstAvailableVariant { ...ProductVariantFields }
            }
        } ",
        product_card_fragment!(),
        " ",
        variant_fragment!()
    ),
);

#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: ProductConnection,
}

graphql_operation!(
    /// One page of the full catalog.
    GetProducts,
    "GetProducts",
    PageVariables,
    ProductsData,
    concat!(
        "query GetProducts($first: Int, $after: String, $last: Int, $before: String) {
            products(first: $first, after: $after, last: $last, before: $before) {
                nodes { ...ProductCard } ",
        page_info_fields!(),
        " } } ",
        product_card_fragment!()
    ),
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationVariables {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsData {
    pub product_recommendations: Option<Vec<Product>>,
}

graphql_operation!(
    /// Products related to a product.
    GetProductRecommendations,
    "GetProductRecommendations",
    RecommendationVariables,
    RecommendationsData,
    concat!(
        "query GetProductRecommendations($productId: ID!) {
            productRecommendations(productId: $productId, intent: RELATED) { ...ProductCard }
        } ",
        product_card_fragment!()
    ),
);

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CollectionsData {
    pub collections: CollectionConnection,
}

graphql_operation!(
    /// One page of collections.
    GetCollections,
    "GetCollections",
    PageVariables,
    CollectionsData,
    concat!(
        "query GetCollections($first: Int, $after: String, $last: Int, $before: String) {
            collections(first: $first, after: $after, last: $last, before: $before) {
                nodes { id handle title description image { ",
        image_fields!(),
        " } } ",
        page_info_fields!(),
        " } }"
    ),
);

#[derive(Debug, Deserialize)]
pub struct CollectionData {
    pub collection: Option<Collection>,
}

graphql_operation!(
    /// A collection with one page of its products.
    GetCollectionByHandle,
    "GetCollectionByHandle",
    HandlePageVariables,
    CollectionData,
    concat!(
        "query GetCollectionByHandle($handle: String!, $first: Int, $after: String, $last: Int, $before: String) {
            collection(handle: $handle) {
                id handle title description descriptionHtml
                seo { title description }
                image { ",
        image_fields!(),
        " }
                products(first: $first, after: $after, last: $last, before: $before) {
                    nodes { ...ProductCard } ",
        page_info_fields!(),
        " } } } ",
        product_card_fragment!()
    ),
);

// =============================================================================
// Pages & policies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PageData {
    pub page: Option<ShopPage>,
}

graphql_operation!(
    /// An Online Store page.
    GetPage,
    "GetPage",
    HandleVariables,
    PageData,
    "query GetPage($handle: String!) {
        page(handle: $handle) { id handle title body seo { title description } }
    }",
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleVariables {
    pub blog_handle: String,
    pub article_handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBlogData {
    pub title: String,
    pub article_by_handle: Option<Article>,
}

#[derive(Debug, Deserialize)]
pub struct ArticleData {
    pub blog: Option<ArticleBlogData>,
}

graphql_operation!(
    /// A blog article by blog and article handle.
    GetArticle,
    "GetArticle",
    ArticleVariables,
    ArticleData,
    concat!(
        "query GetArticle($blogHandle: String!, $articleHandle: String!) {
            blog(handle: $blogHandle) {
                title
                articleByHandle(handle: $articleHandle) {
                    id handle title contentHtml publishedAt
                    authorV2 { name }
                    image { ",
        image_fields!(),
        " }
                    seo { title description }
                }
            }
        }"
    ),
);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyShop {
    pub privacy_policy: Option<ShopPolicy>,
    pub shipping_policy: Option<ShopPolicy>,
    pub terms_of_service: Option<ShopPolicy>,
    pub refund_policy: Option<ShopPolicy>,
}

impl PolicyShop {
    /// Policies that are configured, in footer order.
    #[must_use]
    pub fn into_vec(self) -> Vec<ShopPolicy> {
        [
            self.privacy_policy,
            self.shipping_policy,
            self.terms_of_service,
            self.refund_policy,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PoliciesData {
    pub shop: PolicyShop,
}

graphql_operation!(
    /// All legal policies.
    GetPolicies,
    "GetPolicies",
    NoVariables,
    PoliciesData,
    "query GetPolicies {
        shop {
            privacyPolicy { ...PolicyFields }
            shippingPolicy { ...PolicyFields }
            termsOfService { ...PolicyFields }
            refundPolicy { ...PolicyFields }
        }
    }
    fragment PolicyFields on ShopPolicy { id handle title body url }",
);

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveSearchVariables {
    pub term: String,
    pub limit: i64,
    pub types: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveSearchData {
    pub predictive_search: Option<PredictiveSearchResult>,
}

graphql_operation!(
    /// Typeahead results across articles, collections, pages, products and queries.
    PredictiveSearch,
    "PredictiveSearch",
    PredictiveSearchVariables,
    PredictiveSearchData,
    concat!(
        "query PredictiveSearch($term: String!, $limit: Int!, $types: [PredictiveSearchType!]) {
            predictiveSearch(query: $term, limit: $limit, limitScope: EACH, types: $types) {
                articles { id handle title trackingParameters blog { handle } image { ",
        image_fields!(),
        " } }
                collections { id handle title trackingParameters image { ",
        image_fields!(),
        " } }
                pages { id handle title trackingParameters }
                products {
                    id handle title trackingParameters
                    selectedOrFirstAvailableVariant { ...ProductVariantFields }
                }
                queries { text styledText trackingParameters }
            }
        } ",
        variant_fragment!()
    ),
);

#[derive(Debug, Clone, Serialize)]
pub struct SearchVariables {
    pub term: String,
    #[serde(flatten)]
    pub page: PageVariables,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    pub search: SearchResults,
}

graphql_operation!(
    /// Full-text search over products, pages and articles.
    Search,
    "Search",
    SearchVariables,
    SearchData,
    concat!(
        "query Search($term: String!, $first: Int, $after: String, $last: Int, $before: String) {
            search(
                query: $term
                types: [PRODUCT, PAGE, ARTICLE]
                unavailableProducts: HIDE
                first: $first, after: $after, last: $last, before: $before
            ) {
                totalCount
                nodes {
                    __typename
                    ... on Product { ...ProductCard }
                    ... on Page { handle title }
                    ... on Article { handle title blog { handle } }
                } ",
        page_info_fields!(),
        " } } ",
        product_card_fragment!()
    ),
);

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdVariables {
    pub cart_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Option<Cart>,
}

graphql_operation!(
    /// Fetch a cart by id.
    GetCart,
    "GetCart",
    CartIdVariables,
    CartData,
    concat!(
        "query GetCart($cartId: ID!) { cart(id: $cartId) { ...CartFields } } ",
        cart_fragment!()
    ),
);

/// `CartInput` for `cartCreate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInput {
    pub lines: Vec<CartLineInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_identity: Option<CartBuyerIdentityInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartCreateVariables {
    pub input: CartInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateVariables {
    pub cart_id: String,
    pub lines: Vec<CartLineUpdateInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesRemoveVariables {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscountCodesVariables {
    pub cart_id: String,
    pub discount_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartGiftCardCodesVariables {
    pub cart_id: String,
    pub gift_card_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNoteVariables {
    pub cart_id: String,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentityVariables {
    pub cart_id: String,
    pub buyer_identity: CartBuyerIdentityInput,
}

/// Declare a cart mutation operation with its response type.
macro_rules! cart_operation {
    (
        $name:ident, $data:ident, $vars:ty, $field:ident, $graphql_field:literal,
        params: $params:literal, args: $args:literal, failure: $failure:literal $(,)?
    ) => {
        #[derive(Debug, Deserialize)]
        pub struct $data {
            #[serde(rename = $graphql_field)]
            pub $field: Option<CartMutationPayload>,
        }

        graphql_operation!(
            $name,
            stringify!($name),
            $vars,
            $data,
            concat!(
                "mutation ",
                stringify!($name),
                $params,
                " { ",
                $graphql_field,
                $args,
                " { ",
                cart_mutation_payload!(),
                " } } ",
                cart_fragment!()
            ),
        );

        impl CartMutation for $name {
            const FAILURE: &'static str = $failure;

            fn payload(data: Self::ResponseData) -> Option<CartMutationPayload> {
                data.$field
            }
        }
    };
}

cart_operation!(
    CartCreate, CartCreateData, CartCreateVariables, cart_create, "cartCreate",
    params: "($input: CartInput!)",
    args: "(input: $input)",
    failure: "Failed to create cart",
);

cart_operation!(
    CartLinesAdd, CartLinesAddData, CartLinesAddVariables, cart_lines_add, "cartLinesAdd",
    params: "($cartId: ID!, $lines: [CartLineInput!]!)",
    args: "(cartId: $cartId, lines: $lines)",
    failure: "Failed to add to cart",
);

cart_operation!(
    CartLinesUpdate, CartLinesUpdateData, CartLinesUpdateVariables, cart_lines_update, "cartLinesUpdate",
    params: "($cartId: ID!, $lines: [CartLineUpdateInput!]!)",
    args: "(cartId: $cartId, lines: $lines)",
    failure: "Failed to update cart",
);

cart_operation!(
    CartLinesRemove, CartLinesRemoveData, CartLinesRemoveVariables, cart_lines_remove, "cartLinesRemove",
    params: "($cartId: ID!, $lineIds: [ID!]!)",
    args: "(cartId: $cartId, lineIds: $lineIds)",
    failure: "Failed to remove from cart",
);

cart_operation!(
    CartDiscountCodesUpdate, CartDiscountCodesData, CartDiscountCodesVariables,
    cart_discount_codes_update, "cartDiscountCodesUpdate",
    params: "($cartId: ID!, $discountCodes: [String!])",
    args: "(cartId: $cartId, discountCodes: $discountCodes)",
    failure: "Failed to update discount codes",
);

cart_operation!(
    CartGiftCardCodesUpdate, CartGiftCardCodesData, CartGiftCardCodesVariables,
    cart_gift_card_codes_update, "cartGiftCardCodesUpdate",
    params: "($cartId: ID!, $giftCardCodes: [String!]!)",
    args: "(cartId: $cartId, giftCardCodes: $giftCardCodes)",
    failure: "Failed to update gift card codes",
);

cart_operation!(
    CartNoteUpdate, CartNoteData, CartNoteVariables, cart_note_update, "cartNoteUpdate",
    params: "($cartId: ID!, $note: String!)",
    args: "(cartId: $cartId, note: $note)",
    failure: "Failed to update cart note",
);

cart_operation!(
    CartBuyerIdentityUpdate, CartBuyerIdentityData, CartBuyerIdentityVariables,
    cart_buyer_identity_update, "cartBuyerIdentityUpdate",
    params: "($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!)",
    args: "(cartId: $cartId, buyerIdentity: $buyerIdentity)",
    failure: "Failed to update buyer identity",
);
