//! Shopify Customer Account API client.
//!
//! The Customer Account API provides access to customer authentication and
//! account management. Uses OAuth 2.0 for authentication.
//!
//! # OAuth Flow
//!
//! 1. Generate authorization URL with `authorization_url()`
//! 2. Redirect customer to Shopify's login page
//! 3. Shopify redirects back with authorization code
//! 4. Exchange code for tokens with `exchange_code()`
//! 5. Use access token for customer-scoped API calls
//!
//! # Example
//!
//! ```rust,ignore
//! use novabox_storefront::shopify::CustomerClient;
//!
//! let client = CustomerClient::new(&config.shopify);
//!
//! let auth_url = client.authorization_url("https://novabox.digital/account/callback", &state, &nonce);
//!
//! // After OAuth callback, exchange code for token
//! let token = client.exchange_code(&code, "https://novabox.digital/account/callback").await?;
//!
//! let customer = client.get_customer(&token.access_token).await?;
//! ```

mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::PageRequest;

/// Orders per page in the order history.
pub const ORDERS_PAGE_SIZE: i64 = 20;

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ShopifyError::message(messages.join("; ")));
        }

        self.data
            .ok_or_else(|| ShopifyError::message("No data in response"))
    }
}

/// `{ <payload>, userErrors }` mutation result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationResult<T> {
    #[serde(flatten)]
    payload: T,
    user_errors: Vec<CustomerUserError>,
}

impl<T> MutationResult<T> {
    /// First user error becomes a `UserError`.
    fn into_payload(self) -> Result<T, ShopifyError> {
        match self.user_errors.into_iter().next() {
            Some(error) => Err(ShopifyError::UserError(error.message)),
            None => Ok(self.payload),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query Documents
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! address_fields {
    () => {
        "id formatted firstName lastName company address1 address2 \
         territoryCode zoneCode city zip phoneNumber"
    };
}

macro_rules! customer_fields {
    () => {
        concat!(
            "id firstName lastName ",
            "emailAddress { emailAddress } ",
            "phoneNumber { phoneNumber } ",
            "defaultAddress { ",
            address_fields!(),
            " } ",
            "addresses(first: 6) { nodes { ",
            address_fields!(),
            " } }"
        )
    };
}

macro_rules! money {
    () => {
        "{ amount currencyCode }"
    };
}

const CUSTOMER_QUERY: &str = concat!("query CustomerDetails { customer { ", customer_fields!(), " } }");

const CUSTOMER_UPDATE: &str = concat!(
    "mutation customerUpdate($customer: CustomerUpdateInput!) { ",
    "customerUpdate(input: $customer) { customer { ",
    customer_fields!(),
    " } userErrors { code field message } } }"
);

const ORDERS_QUERY: &str = concat!(
    "query CustomerOrders($first: Int, $last: Int, $after: String, $before: String) { ",
    "customer { orders(sortKey: PROCESSED_AT, reverse: true, ",
    "first: $first, last: $last, after: $after, before: $before) { ",
    "nodes { id number processedAt financialStatus ",
    "fulfillments(first: 1) { nodes { status } } ",
    "totalPrice ",
    money!(),
    " } ",
    "pageInfo { hasNextPage hasPreviousPage startCursor endCursor } } } }"
);

const ORDER_QUERY: &str = concat!(
    "query Order($orderId: ID!) { order(id: $orderId) { ",
    "id name statusPageUrl processedAt financialStatus ",
    "fulfillments(first: 1) { nodes { status } } ",
    "subtotal ",
    money!(),
    " totalTax ",
    money!(),
    " totalPrice ",
    money!(),
    " shippingAddress { name formatted(withName: true) formattedArea } ",
    "discountApplications(first: 100) { nodes { value { __typename ",
    "... on MoneyV2 { amount currencyCode } ",
    "... on PricingPercentageValue { percentage } } } } ",
    "lineItems(first: 100) { nodes { id title quantity variantTitle ",
    "image { altText height url width } ",
    "price ",
    money!(),
    " totalDiscount ",
    money!(),
    " } } } }"
);

const ADDRESS_CREATE: &str = concat!(
    "mutation customerAddressCreate($address: CustomerAddressInput!, $defaultAddress: Boolean) { ",
    "customerAddressCreate(address: $address, defaultAddress: $defaultAddress) { ",
    "customerAddress { ",
    address_fields!(),
    " } userErrors { code field message } } }"
);

const ADDRESS_UPDATE: &str = concat!(
    "mutation customerAddressUpdate($address: CustomerAddressInput!, $addressId: ID!, $defaultAddress: Boolean) { ",
    "customerAddressUpdate(address: $address, addressId: $addressId, defaultAddress: $defaultAddress) { ",
    "customerAddress { ",
    address_fields!(),
    " } userErrors { code field message } } }"
);

const ADDRESS_DELETE: &str = concat!(
    "mutation customerAddressDelete($addressId: ID!) { ",
    "customerAddressDelete(addressId: $addressId) { ",
    "deletedAddressId userErrors { code field message } } }"
);

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
///
/// This client handles OAuth authentication and provides methods for
/// accessing customer data, orders, and addresses.
#[derive(Clone)]
pub struct CustomerClient {
    inner: Arc<CustomerClientInner>,
}

struct CustomerClientInner {
    client: reqwest::Client,
    /// `https://shopify.com/{shop_id}`
    auth_base: String,
    /// GraphQL endpoint.
    api_url: String,
    client_id: String,
    client_secret: String,
}

impl CustomerClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let auth_base = format!("https://shopify.com/{}", config.customer_shop_id);
        let api_url = format!(
            "{auth_base}/account/customer/api/{}/graphql",
            config.api_version
        );

        Self::with_base_urls(
            auth_base,
            api_url,
            &config.customer_client_id,
            config.customer_client_secret.expose_secret(),
        )
    }

    /// Create a client against explicit OAuth and GraphQL endpoints.
    #[must_use]
    pub fn with_base_urls(
        auth_base: impl Into<String>,
        api_url: impl Into<String>,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        Self {
            inner: Arc::new(CustomerClientInner {
                client: reqwest::Client::new(),
                auth_base: auth_base.into(),
                api_url: api_url.into(),
                client_id: client_id.to_owned(),
                client_secret: client_secret.to_owned(),
            }),
        }
    }

    /// Get the OAuth client ID (safe to expose in frontend).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for customer login.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    /// * `nonce` - A random string for `OpenID` Connect replay protection
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        format!(
            "{}/auth/oauth/authorize?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20customer-account-api:full&\
            state={}&\
            nonce={}",
            self.inner.auth_base,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Generate the logout URL.
    ///
    /// # Arguments
    ///
    /// * `id_token` - The ID token from the current session
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    #[must_use]
    pub fn logout_url(&self, id_token: &str, post_logout_redirect_uri: &str) -> String {
        format!(
            "{}/auth/oauth/logout?\
            id_token_hint={}&\
            post_logout_redirect_uri={}",
            self.inner.auth_base,
            urlencoding::encode(id_token),
            urlencoding::encode(post_logout_redirect_uri)
        )
    }

    /// Exchange an authorization code for access tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        self.token_request(&params, "Token exchange failed").await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    #[instrument(skip_all)]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("refresh_token", refresh_token),
        ];

        self.token_request(&params, "Token refresh failed").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        failure: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let url = format!("{}/auth/oauth/token", self.inner.auth_base);

        let response = self.inner.client.post(&url).form(params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!("{failure}: {text}")));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL query against the Customer Account API.
    async fn query<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let request = GraphQLRequest { query, variables };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .header("User-Agent", "Novabox/1.0")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Customer API request failed ({status}): {text}"
            )));
        }

        let gql_response: GraphQLResponse<T> = response.json().await?;
        gql_response.into_result()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the current customer's profile and addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, access_token: &str) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: Customer,
        }

        let response: Response = self.query(access_token, CUSTOMER_QUERY, None).await?;
        Ok(response.customer)
    }

    /// Update the current customer's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip_all)]
    pub async fn update_customer(
        &self,
        access_token: &str,
        input: CustomerUpdateInput,
    ) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_update: MutationResult<Payload>,
        }

        #[derive(Deserialize)]
        struct Payload {
            customer: Option<Customer>,
        }

        let variables = serde_json::json!({ "customer": input });
        let response: Response = self.query(access_token, CUSTOMER_UPDATE, Some(variables)).await?;

        response
            .customer_update
            .into_payload()?
            .customer
            .ok_or_else(|| ShopifyError::message("Customer profile update failed."))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Order Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get one page of the customer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        page: &PageRequest,
    ) -> Result<OrderConnection, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithOrders,
        }

        #[derive(Deserialize)]
        struct CustomerWithOrders {
            orders: OrderConnection,
        }

        let variables = serde_json::to_value(page.variables(ORDERS_PAGE_SIZE))?;
        let response: Response = self.query(access_token, ORDERS_QUERY, Some(variables)).await?;

        Ok(response.customer.orders)
    }

    /// Get a single order by GID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or belongs to another
    /// customer, or an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_order(
        &self,
        access_token: &str,
        order_id: &str,
    ) -> Result<OrderDetail, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            order: Option<OrderDetail>,
        }

        let variables = serde_json::json!({ "orderId": order_id });
        let response: Response = self.query(access_token, ORDER_QUERY, Some(variables)).await?;

        response
            .order
            .ok_or_else(|| ShopifyError::NotFound(format!("Order not found: {order_id}")))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new address for the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        access_token: &str,
        address: &CustomerAddressInput,
        default_address: bool,
    ) -> Result<CustomerAddress, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_create: Option<MutationResult<AddressPayload>>,
        }

        let variables = serde_json::json!({
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, ADDRESS_CREATE, Some(variables)).await?;

        response
            .customer_address_create
            .map(MutationResult::into_payload)
            .transpose()?
            .and_then(|p| p.customer_address)
            .ok_or_else(|| ShopifyError::message("Customer address create failed."))
    }

    /// Update an existing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token, address))]
    pub async fn update_address(
        &self,
        access_token: &str,
        address_id: &str,
        address: &CustomerAddressInput,
        default_address: bool,
    ) -> Result<CustomerAddress, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_update: Option<MutationResult<AddressPayload>>,
        }

        let variables = serde_json::json!({
            "addressId": address_id,
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, ADDRESS_UPDATE, Some(variables)).await?;

        response
            .customer_address_update
            .map(MutationResult::into_payload)
            .transpose()?
            .and_then(|p| p.customer_address)
            .ok_or_else(|| ShopifyError::message("Customer address update failed."))
    }

    /// Delete an address, returning the deleted address ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token))]
    pub async fn delete_address(
        &self,
        access_token: &str,
        address_id: &str,
    ) -> Result<String, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_delete: Option<MutationResult<DeletePayload>>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DeletePayload {
            deleted_address_id: Option<String>,
        }

        let variables = serde_json::json!({ "addressId": address_id });
        let response: Response = self.query(access_token, ADDRESS_DELETE, Some(variables)).await?;

        response
            .customer_address_delete
            .map(MutationResult::into_payload)
            .transpose()?
            .and_then(|p| p.deleted_address_id)
            .ok_or_else(|| ShopifyError::message("Customer address delete failed."))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressPayload {
    customer_address: Option<CustomerAddress>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> CustomerClient {
        CustomerClient::with_base_urls(
            "https://shopify.com/12345",
            "https://shopify.com/12345/account/customer/api/2025-01/graphql",
            "shp_client",
            "secret",
        )
    }

    #[test]
    fn test_authorization_url() {
        let url = client().authorization_url("https://novabox.digital/account/callback", "st", "nc");
        assert!(url.starts_with("https://shopify.com/12345/auth/oauth/authorize?"));
        assert!(url.contains("client_id=shp_client"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fnovabox.digital%2Faccount%2Fcallback"));
        assert!(url.contains("state=st"));
        assert!(url.contains("nonce=nc"));
        assert!(url.contains("scope=openid%20email%20customer-account-api:full"));
    }

    #[test]
    fn test_logout_url() {
        let url = client().logout_url("id.token", "https://novabox.digital/");
        assert_eq!(
            url,
            "https://shopify.com/12345/auth/oauth/logout?id_token_hint=id.token&post_logout_redirect_uri=https%3A%2F%2Fnovabox.digital%2F"
        );
    }

    #[test]
    fn test_mutation_result_first_user_error() {
        let result: MutationResult<AddressPayload> = serde_json::from_value(serde_json::json!({
            "customerAddress": null,
            "userErrors": [
                { "code": "INVALID", "field": ["address", "zip"], "message": "Zip is invalid" },
                { "code": "BLANK", "field": ["address", "city"], "message": "City is blank" }
            ]
        }))
        .unwrap();

        let err = result.into_payload().unwrap_err();
        assert!(matches!(err, ShopifyError::UserError(m) if m == "Zip is invalid"));
    }

    #[test]
    fn test_graphql_response_errors() {
        let response: GraphQLResponse<serde_json::Value> = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "Access denied" }]
        }))
        .unwrap();

        assert_eq!(
            response.into_result().unwrap_err().to_string(),
            "GraphQL errors: Access denied"
        );
    }

    #[test]
    fn test_order_query_requests_discount_variants() {
        assert!(ORDER_QUERY.contains("... on PricingPercentageValue { percentage }"));
        assert!(ORDERS_QUERY.contains("sortKey: PROCESSED_AT, reverse: true"));
        assert!(CUSTOMER_QUERY.contains("addresses(first: 6)"));
    }
}
