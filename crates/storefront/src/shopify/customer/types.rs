//! Types for Shopify Customer Account API OAuth and responses.

use chrono::{DateTime, Utc};
use novabox_core::{FinancialStatus, FulfillmentStatus, ShopifyGid};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{Image, Money, PageInfo, nodes};

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Customer access token obtained via OAuth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect).
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl CustomerAccessToken {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let now = Utc::now().timestamp();
            let expires_at = self.obtained_at + expires_in;
            now >= (expires_at - 60)
        })
    }
}

/// Raw token response from Shopify OAuth endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for CustomerAccessToken {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEmailAddress {
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPhoneNumber {
    pub phone_number: Option<String>,
}

/// A Shopify customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<CustomerEmailAddress>,
    pub phone_number: Option<CustomerPhoneNumber>,
    pub default_address: Option<CustomerAddress>,
    #[serde(default, deserialize_with = "nodes")]
    pub addresses: Vec<CustomerAddress>,
}

impl Customer {
    /// Get the customer's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_owned(),
            (None, Some(last)) => last.to_owned(),
            (None, None) => String::new(),
        }
    }

    /// Primary email address, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email_address
            .as_ref()
            .and_then(|e| e.email_address.as_deref())
    }

    /// Account heading: `Welcome, {first}` or a generic greeting.
    #[must_use]
    pub fn greeting(&self) -> String {
        match self.first_name.as_deref().filter(|n| !n.is_empty()) {
            Some(first) => format!("Welcome, {first}"),
            None => "Welcome to your account.".to_owned(),
        }
    }

    /// Whether `address_id` is the default address.
    #[must_use]
    pub fn is_default_address(&self, address_id: &str) -> bool {
        self.default_address
            .as_ref()
            .is_some_and(|a| a.id == address_id)
    }
}

/// A customer address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub id: String,
    /// Lines as Shopify formats them for display.
    #[serde(default)]
    pub formatted: Vec<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    /// ISO country code.
    pub territory_code: Option<String>,
    /// Province/state code.
    pub zone_code: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub phone_number: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Order Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OrderFulfillment {
    pub status: Option<FulfillmentStatus>,
}

/// Order row in the order history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    /// Order number (e.g. `1001`).
    pub number: i64,
    pub processed_at: String,
    pub financial_status: Option<FinancialStatus>,
    #[serde(default, deserialize_with = "nodes")]
    pub fulfillments: Vec<OrderFulfillment>,
    pub total_price: Money,
}

impl OrderSummary {
    /// First fulfillment's status, or `Unfulfilled`.
    #[must_use]
    pub fn fulfillment_status(&self) -> FulfillmentStatus {
        first_fulfillment_status(&self.fulfillments)
    }

    /// Path segment token for `/account/orders/{token}`.
    #[must_use]
    pub fn url_token(&self) -> String {
        ShopifyGid::parse(&self.id).map_or_else(|_| self.id.clone(), |gid| gid.to_url_token())
    }

    /// Long date, e.g. `January 5, 2025`.
    #[must_use]
    pub fn processed_date(&self) -> String {
        long_date(&self.processed_at)
    }
}

/// One page of order history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConnection {
    #[serde(rename = "nodes")]
    pub orders: Vec<OrderSummary>,
    pub page_info: PageInfo,
}

/// Shipping address as formatted by Shopify.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub name: Option<String>,
    #[serde(default)]
    pub formatted: Vec<String>,
    pub formatted_area: Option<String>,
}

/// Value of a discount application.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum DiscountValue {
    MoneyV2(Money),
    PricingPercentageValue { percentage: f64 },
}

impl DiscountValue {
    /// `-10% OFF` or `-$5.00`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::MoneyV2(money) => format!("-{}", money.display()),
            Self::PricingPercentageValue { percentage } => format!("-{percentage}% OFF"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountApplication {
    pub value: DiscountValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: Option<String>,
    pub title: String,
    pub quantity: i64,
    pub variant_title: Option<String>,
    pub image: Option<Image>,
    pub price: Option<Money>,
    pub total_discount: Option<Money>,
}

impl OrderLineItem {
    /// Variant title unless it is Shopify's placeholder.
    #[must_use]
    pub fn display_variant_title(&self) -> Option<&str> {
        self.variant_title
            .as_deref()
            .filter(|t| !t.is_empty() && *t != "Default Title")
    }
}

/// Full order for the order detail page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: String,
    pub name: String,
    pub status_page_url: Option<String>,
    pub processed_at: String,
    pub financial_status: Option<FinancialStatus>,
    #[serde(default, deserialize_with = "nodes")]
    pub fulfillments: Vec<OrderFulfillment>,
    pub subtotal: Option<Money>,
    pub total_tax: Option<Money>,
    pub total_price: Money,
    pub shipping_address: Option<OrderAddress>,
    #[serde(default, deserialize_with = "nodes")]
    pub discount_applications: Vec<DiscountApplication>,
    #[serde(default, deserialize_with = "nodes")]
    pub line_items: Vec<OrderLineItem>,
}

impl OrderDetail {
    /// First fulfillment's status, or `Unfulfilled`.
    #[must_use]
    pub fn fulfillment_status(&self) -> FulfillmentStatus {
        first_fulfillment_status(&self.fulfillments)
    }

    /// Display of the first discount application.
    #[must_use]
    pub fn discount(&self) -> Option<String> {
        self.discount_applications.first().map(|d| d.value.display())
    }

    /// Long date, e.g. `January 5, 2025`.
    #[must_use]
    pub fn processed_date(&self) -> String {
        long_date(&self.processed_at)
    }
}

fn first_fulfillment_status(fulfillments: &[OrderFulfillment]) -> FulfillmentStatus {
    fulfillments
        .first()
        .and_then(|f| f.status)
        .unwrap_or_default()
}

fn long_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_owned(),
        |dt| dt.with_timezone(&Utc).format("%B %-d, %Y").to_string(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating or updating an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddressInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Input for updating customer information.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// User error from a mutation.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerUserError {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_buffer() {
        let now = Utc::now().timestamp();
        let token = CustomerAccessToken {
            access_token: "at".to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: Some(3600),
            obtained_at: now,
        };
        assert!(!token.is_expired());

        let token = CustomerAccessToken {
            obtained_at: now - 3600 + 30,
            ..token
        };
        assert!(token.is_expired());

        let token = CustomerAccessToken {
            expires_in: None,
            ..token
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn test_order_summary_deserialize() {
        let order: OrderSummary = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Order/1",
            "number": 1001,
            "processedAt": "2025-01-05T15:30:00Z",
            "financialStatus": "PAID",
            "fulfillments": { "nodes": [{ "status": "IN_TRANSIT" }] },
            "totalPrice": { "amount": "49.0", "currencyCode": "USD" }
        }))
        .unwrap();

        assert_eq!(order.processed_date(), "January 5, 2025");
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::InTransit);
        assert_eq!(order.financial_status, Some(FinancialStatus::Paid));
        assert_eq!(order.url_token(), "Z2lkOi8vc2hvcGlmeS9PcmRlci8x");
        assert_eq!(order.total_price.display(), "$49.00");
    }

    #[test]
    fn test_order_without_fulfillments_is_unfulfilled() {
        let order: OrderSummary = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Order/2",
            "number": 1002,
            "processedAt": "2025-03-01T00:00:00Z",
            "financialStatus": null,
            "fulfillments": { "nodes": [] },
            "totalPrice": { "amount": "10.0", "currencyCode": "USD" }
        }))
        .unwrap();

        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Unfulfilled);
    }

    #[test]
    fn test_discount_display() {
        let percent: DiscountValue = serde_json::from_value(serde_json::json!({
            "__typename": "PricingPercentageValue",
            "percentage": 10.0
        }))
        .unwrap();
        assert_eq!(percent.display(), "-10% OFF");

        let fixed: DiscountValue = serde_json::from_value(serde_json::json!({
            "__typename": "MoneyV2",
            "amount": "5.0",
            "currencyCode": "USD"
        }))
        .unwrap();
        assert_eq!(fixed.display(), "-$5.00");
    }

    #[test]
    fn test_customer_greeting() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Customer/1",
            "firstName": "Ada",
            "lastName": null,
            "emailAddress": { "emailAddress": "ada@example.com" },
            "phoneNumber": null,
            "defaultAddress": null,
            "addresses": { "nodes": [] }
        }))
        .unwrap();

        assert_eq!(customer.greeting(), "Welcome, Ada");
        assert_eq!(customer.full_name(), "Ada");
        assert_eq!(customer.email(), Some("ada@example.com"));

        let anonymous = Customer {
            first_name: None,
            ..customer
        };
        assert_eq!(anonymous.greeting(), "Welcome to your account.");
    }

    #[test]
    fn test_address_input_skips_empty_fields() {
        let input = CustomerAddressInput {
            first_name: Some("Ada".to_string()),
            zone_code: Some("CA".to_string()),
            ..CustomerAddressInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({ "firstName": "Ada", "zoneCode": "CA" })
        );
    }
}
