//! Address book.
//!
//! Browsers without JavaScript cannot send `PUT`/`DELETE`, so each address
//! form also posts to `/account/addresses/{id}` with a `_method` field. The
//! required-field and phone checks the forms do client side are repeated
//! here before anything reaches Shopify.

use std::sync::LazyLock;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AccountError, AccountNav, AccountSection, api_error, load_customer, private};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequireShopifyCustomer};
use crate::routes::is_htmx;
use crate::shopify::ShopifyError;
use crate::shopify::customer::{Customer, CustomerAddress, CustomerAddressInput};
use crate::state::AppState;
use crate::views::Layout;

const ADDRESSES_PATH: &str = "/account/addresses";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{3,14}$").expect("Invalid regex"));

// =============================================================================
// Form
// =============================================================================

/// Address form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zone_code: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub territory_code: String,
    #[serde(default)]
    pub phone_number: String,
    /// Checkbox: `on` when ticked.
    pub default_address: Option<String>,
    /// Method override for non-JS forms.
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl AddressForm {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.default_address.as_deref() == Some("on")
    }

    /// Validate into API input.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<CustomerAddressInput, String> {
        let required = [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
            ("Address", &self.address1),
            ("City", &self.city),
            ("State / Province", &self.zone_code),
            ("Zip / Postal code", &self.zip),
            ("Country", &self.territory_code),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("{label} is required"));
        }

        let phone = self.phone_number.trim();
        if !phone.is_empty() && !PHONE_RE.is_match(phone) {
            return Err("Please enter a valid phone number, e.g. +16135550135".to_owned());
        }

        let optional = |v: &str| Some(v.trim().to_owned()).filter(|v| !v.is_empty());
        Ok(CustomerAddressInput {
            first_name: optional(&self.first_name),
            last_name: optional(&self.last_name),
            company: optional(&self.company),
            address1: optional(&self.address1),
            address2: optional(&self.address2),
            city: optional(&self.city),
            zone_code: optional(&self.zone_code),
            zip: optional(&self.zip),
            territory_code: optional(&self.territory_code).map(|c| c.to_uppercase()),
            phone_number: optional(phone),
        })
    }
}

// =============================================================================
// View Models
// =============================================================================

/// Values and error of one address form.
#[derive(Clone, Default)]
pub struct AddressFormView {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub zone_code: String,
    pub zip: String,
    pub territory_code: String,
    pub phone_number: String,
    pub default_address: bool,
    pub error: Option<String>,
}

impl AddressFormView {
    fn from_address(address: &CustomerAddress, is_default: bool) -> Self {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            first_name: value(&address.first_name),
            last_name: value(&address.last_name),
            company: value(&address.company),
            address1: value(&address.address1),
            address2: value(&address.address2),
            city: value(&address.city),
            zone_code: value(&address.zone_code),
            zip: value(&address.zip),
            territory_code: value(&address.territory_code),
            phone_number: value(&address.phone_number),
            default_address: is_default,
            error: None,
        }
    }

    fn from_form(form: &AddressForm, error: String) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            company: form.company.clone(),
            address1: form.address1.clone(),
            address2: form.address2.clone(),
            city: form.city.clone(),
            zone_code: form.zone_code.clone(),
            zip: form.zip.clone(),
            territory_code: form.territory_code.clone(),
            phone_number: form.phone_number.clone(),
            default_address: form.is_default(),
            error: Some(error),
        }
    }
}

/// A saved address with its edit form.
#[derive(Clone)]
pub struct AddressView {
    pub id: String,
    /// `id` encoded for use as a path segment.
    pub path: String,
    pub formatted: Vec<String>,
    pub is_default: bool,
    pub form: AddressFormView,
}

/// Address book page.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub nav: AccountNav,
    pub list: AddressList,
}

/// Address list fragment (for htmx).
#[derive(Template, WebTemplate)]
#[template(path = "partials/address_list.html")]
pub struct AddressListTemplate {
    pub list: AddressList,
}

/// Saved addresses plus the new-address form.
#[derive(Clone, Default)]
pub struct AddressList {
    pub addresses: Vec<AddressView>,
    pub new_address: AddressFormView,
    pub notice: Option<String>,
}

/// Which form a failed submission came from.
enum Target<'a> {
    New,
    Existing(&'a str),
}

impl AddressList {
    fn new(customer: &Customer) -> Self {
        let mut addresses: Vec<AddressView> = customer
            .addresses
            .iter()
            .map(|address| {
                let is_default = customer.is_default_address(&address.id);
                AddressView {
                    id: address.id.clone(),
                    path: format!("{ADDRESSES_PATH}/{}", urlencoding::encode(&address.id)),
                    formatted: address.formatted.clone(),
                    is_default,
                    form: AddressFormView::from_address(address, is_default),
                }
            })
            .collect();
        // Default address first
        addresses.sort_by_key(|a| !a.is_default);

        Self {
            addresses,
            new_address: AddressFormView::default(),
            notice: None,
        }
    }

    fn with_failure(mut self, target: &Target<'_>, form: &AddressForm, error: String) -> Self {
        let view = AddressFormView::from_form(form, error);
        match target {
            Target::New => self.new_address = view,
            Target::Existing(id) => {
                if let Some(address) = self.addresses.iter_mut().find(|a| a.id == *id) {
                    address.form = view;
                }
            }
        }
        self
    }
}

// =============================================================================
// Rendering
// =============================================================================

struct AddressPage {
    state: AppState,
    session: Session,
    access_token: String,
    nonce: CspNonce,
    htmx: bool,
}

impl AddressPage {
    fn render(self, customer: &Customer, list: AddressList, status: StatusCode) -> Response {
        if self.htmx {
            return private((status, AddressListTemplate { list }));
        }
        private((
            status,
            AddressesTemplate {
                layout: Layout::new(&self.state, self.nonce, "Addresses"),
                nav: AccountNav::new(customer, AccountSection::Addresses),
                list,
            },
        ))
    }

    /// Re-render with `error` attached to the submitting form.
    async fn failure(
        self,
        target: &Target<'_>,
        form: &AddressForm,
        error: String,
    ) -> Result<Response, AccountError> {
        let customer = load_customer(&self.state, &self.session, &self.access_token).await?;
        let list = AddressList::new(&customer).with_failure(target, form, error);
        Ok(self.render(&customer, list, StatusCode::BAD_REQUEST))
    }

    /// Show the updated list (htmx) or redirect back to it.
    async fn success(self, notice: &str) -> Result<Response, AccountError> {
        if !self.htmx {
            return Ok(Redirect::to(ADDRESSES_PATH).into_response());
        }
        let customer = load_customer(&self.state, &self.session, &self.access_token).await?;
        let mut list = AddressList::new(&customer);
        list.notice = Some(notice.to_owned());
        Ok(self.render(&customer, list, StatusCode::OK))
    }

    /// API rejection shown on the form, anything else as an error page.
    async fn api_failure(
        self,
        target: &Target<'_>,
        form: &AddressForm,
        error: ShopifyError,
    ) -> Result<Response, AccountError> {
        match error {
            ShopifyError::UserError(message) => {
                tracing::info!(%message, "Address rejected by Shopify");
                self.failure(target, form, message).await
            }
            e => Err(api_error(&self.session, e).await),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the address book.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<Response, AccountError> {
    let customer = load_customer(&state, &session, &token.access_token).await?;
    let page = AddressPage {
        state,
        session,
        access_token: token.access_token,
        nonce,
        htmx: false,
    };
    let list = AddressList::new(&customer);
    Ok(page.render(&customer, list, StatusCode::OK))
}

/// Create an address.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    headers: HeaderMap,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<AddressForm>,
) -> Result<Response, AccountError> {
    let page = AddressPage {
        state,
        session,
        access_token: token.access_token,
        nonce,
        htmx: is_htmx(&headers),
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => return page.failure(&Target::New, &form, error).await,
    };

    let result = page
        .state
        .customer()
        .create_address(&page.access_token, &input, form.is_default())
        .await;
    match result {
        Ok(address) => {
            tracing::info!(address_id = %address.id, "Address created");
            page.success("Address added").await
        }
        Err(e) => page.api_failure(&Target::New, &form, e).await,
    }
}

async fn update_address(
    page: AddressPage,
    address_id: &str,
    form: &AddressForm,
) -> Result<Response, AccountError> {
    let target = Target::Existing(address_id);
    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => return page.failure(&target, form, error).await,
    };

    let result = page
        .state
        .customer()
        .update_address(&page.access_token, address_id, &input, form.is_default())
        .await;
    match result {
        Ok(_) => {
            tracing::info!(%address_id, "Address updated");
            page.success("Address updated").await
        }
        Err(e) => page.api_failure(&target, form, e).await,
    }
}

async fn delete_address(page: AddressPage, address_id: &str) -> Result<Response, AccountError> {
    let result = page
        .state
        .customer()
        .delete_address(&page.access_token, address_id)
        .await;
    match result {
        Ok(_) => {
            tracing::info!(%address_id, "Address deleted");
            page.success("Address removed").await
        }
        Err(ShopifyError::UserError(message)) => {
            Err(AccountError::App(AppError::BadRequest(message)))
        }
        Err(e) => Err(api_error(&page.session, e).await),
    }
}

/// Update an address.
#[instrument(skip(state, session, nonce, headers, token, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    headers: HeaderMap,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(address_id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response, AccountError> {
    let page = AddressPage {
        state,
        session,
        access_token: token.access_token,
        nonce,
        htmx: is_htmx(&headers),
    };
    update_address(page, &address_id, &form).await
}

/// Delete an address.
#[instrument(skip(state, session, nonce, headers, token))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    headers: HeaderMap,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(address_id): Path<String>,
) -> Result<Response, AccountError> {
    let page = AddressPage {
        state,
        session,
        access_token: token.access_token,
        nonce,
        htmx: is_htmx(&headers),
    };
    delete_address(page, &address_id).await
}

/// `POST /account/addresses/{id}` with `_method=PUT|DELETE`.
#[instrument(skip(state, session, nonce, headers, token, form))]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    headers: HeaderMap,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(address_id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response, AccountError> {
    let page = AddressPage {
        state,
        session,
        access_token: token.access_token,
        nonce,
        htmx: is_htmx(&headers),
    };

    match form.method.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some("PUT") => update_address(page, &address_id, &form).await,
        Some("DELETE") => delete_address(page, &address_id).await,
        other => Err(AccountError::App(AppError::BadRequest(format!(
            "Unsupported method: {}",
            other.unwrap_or("none")
        )))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> AddressForm {
        AddressForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            address1: "1 Analytical Way".to_string(),
            city: "Ottawa".to_string(),
            zone_code: "ON".to_string(),
            zip: "K1A 0B1".to_string(),
            territory_code: "ca".to_string(),
            default_address: Some("on".to_string()),
            ..AddressForm::default()
        }
    }

    #[test]
    fn test_valid_address() {
        let form = valid_form();
        let input = form.validate().unwrap();
        assert_eq!(input.territory_code.as_deref(), Some("CA"));
        assert!(input.company.is_none());
        assert!(input.phone_number.is_none());
        assert!(form.is_default());
    }

    #[test]
    fn test_missing_required_field() {
        let form = AddressForm {
            city: "  ".to_string(),
            ..valid_form()
        };
        assert_eq!(form.validate().unwrap_err(), "City is required");
    }

    #[test]
    fn test_phone_validation() {
        for phone in ["+16135550135", "16135550135", "4915112345"] {
            let form = AddressForm {
                phone_number: phone.to_string(),
                ..valid_form()
            };
            assert!(form.validate().is_ok(), "{phone} should be valid");
        }
        for phone in ["+0123456", "555-0135", "+1 613 555", "12"] {
            let form = AddressForm {
                phone_number: phone.to_string(),
                ..valid_form()
            };
            assert!(form.validate().is_err(), "{phone} should be invalid");
        }
    }

    #[test]
    fn test_failure_attaches_to_matching_address() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Customer/1",
            "firstName": "Ada",
            "defaultAddress": { "id": "gid://shopify/CustomerAddress/2" },
            "addresses": { "nodes": [
                { "id": "gid://shopify/CustomerAddress/1", "city": "Paris" },
                { "id": "gid://shopify/CustomerAddress/2", "city": "Ottawa" }
            ]}
        }))
        .unwrap();

        let list = AddressList::new(&customer).with_failure(
            &Target::Existing("gid://shopify/CustomerAddress/1"),
            &valid_form(),
            "Zip is invalid".to_string(),
        );

        let first = list.addresses.first().unwrap();
        assert!(first.is_default);
        assert_eq!(first.id, "gid://shopify/CustomerAddress/2");
        assert!(first.form.error.is_none());

        let failed = list.addresses.get(1).unwrap();
        assert_eq!(failed.form.error.as_deref(), Some("Zip is invalid"));
        assert_eq!(failed.form.city, "Ottawa");
        assert!(failed.path.starts_with("/account/addresses/gid%3A%2F%2F"));
        assert!(list.new_address.error.is_none());
    }
}
