//! Customer account route handlers.
//!
//! Every handler takes [`RequireShopifyCustomer`], so visitors without a
//! token are sent to log in before any API call. A token Shopify rejects
//! mid-session is cleared and the visitor is sent to log in again.
//!
//! [`RequireShopifyCustomer`]: crate::middleware::RequireShopifyCustomer

pub mod addresses;
pub mod orders;
pub mod profile;

use axum::{
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::middleware::{LOGIN_PATH, RequireShopifyCustomer, clear_shopify_customer_token};
use crate::routes::NO_STORE;
use crate::shopify::ShopifyError;
use crate::shopify::customer::Customer;
use crate::state::AppState;

/// Account menu section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSection {
    Orders,
    Profile,
    Addresses,
}

/// Heading and menu shared by account pages.
#[derive(Clone)]
pub struct AccountNav {
    pub greeting: String,
    pub active: AccountSection,
}

impl AccountNav {
    #[must_use]
    pub fn new(customer: &Customer, active: AccountSection) -> Self {
        Self {
            greeting: customer.greeting(),
            active,
        }
    }

    /// Whether `section` is the current menu item.
    #[must_use]
    pub fn is(&self, section: AccountSection) -> bool {
        self.active == section
    }
}

/// Failure inside an account handler.
pub enum AccountError {
    /// Shopify rejected the token; it has been cleared.
    SignedOut,
    App(AppError),
}

impl From<AppError> for AccountError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        match self {
            Self::SignedOut => Redirect::to(LOGIN_PATH).into_response(),
            Self::App(e) => e.into_response(),
        }
    }
}

/// Convert an API error, signing the visitor out on a 401.
pub(crate) async fn api_error(session: &Session, error: ShopifyError) -> AccountError {
    match error {
        ShopifyError::Unauthorized => {
            tracing::info!("Customer token rejected, signing out");
            if let Err(e) = clear_shopify_customer_token(session).await {
                tracing::warn!("Failed to clear customer token: {e}");
            }
            AccountError::SignedOut
        }
        e => AccountError::App(e.into()),
    }
}

/// [`api_error`] for a whole result.
pub(crate) async fn guard<T>(
    session: &Session,
    result: Result<T, ShopifyError>,
) -> Result<T, AccountError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => Err(api_error(session, e).await),
    }
}

/// Fetch the signed-in customer and tag Sentry events with them.
pub(crate) async fn load_customer(
    state: &AppState,
    session: &Session,
    token: &str,
) -> Result<Customer, AccountError> {
    let customer = guard(session, state.customer().get_customer(token).await).await?;
    set_sentry_user(&customer.id, customer.email());
    Ok(customer)
}

/// Mark an account response as private.
pub(crate) fn private(response: impl IntoResponse) -> Response {
    ([(header::CACHE_CONTROL, NO_STORE)], response).into_response()
}

/// `/account` goes to the order history.
pub async fn index(RequireShopifyCustomer(_): RequireShopifyCustomer) -> Response {
    private(Redirect::to("/account/orders"))
}
