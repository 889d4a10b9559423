//! Shopify Customer authentication extractors.
//!
//! The customer's OAuth tokens live in the session. Account handlers take
//! [`RequireShopifyCustomer`], which refreshes an expired access token when a
//! refresh token is available and otherwise sends the visitor to log in.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::session_keys;
use crate::shopify::customer::CustomerAccessToken;
use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/account/login";

/// Extractor that requires Shopify Customer authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(
///     State(state): State<AppState>,
///     RequireShopifyCustomer(token): RequireShopifyCustomer,
/// ) -> Result<impl IntoResponse, AppError> {
///     let orders = state.customer().get_orders(&token.access_token, &page).await?;
///     // ...
/// }
/// ```
pub struct RequireShopifyCustomer(pub CustomerAccessToken);

/// Rejection when a customer session is required but missing.
pub enum ShopifyCustomerRejection {
    /// Redirect to the login route (full page loads).
    RedirectToLogin,
    /// Ask htmx to navigate to the login route.
    HtmxRedirect,
    /// No session layer in front of the handler.
    Unauthorized,
}

impl ShopifyCustomerRejection {
    fn for_request(parts: &Parts) -> Self {
        if parts.headers.contains_key("hx-request") {
            Self::HtmxRedirect
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for ShopifyCustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::HtmxRedirect => {
                let mut response = StatusCode::OK.into_response();
                response
                    .headers_mut()
                    .insert("hx-redirect", HeaderValue::from_static(LOGIN_PATH));
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireShopifyCustomer {
    type Rejection = ShopifyCustomerRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(ShopifyCustomerRejection::Unauthorized)?;

        let token: CustomerAccessToken = session
            .get(session_keys::SHOPIFY_CUSTOMER_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| ShopifyCustomerRejection::for_request(parts))?;

        if !token.is_expired() {
            return Ok(Self(token));
        }

        match refresh(state, &session, token).await {
            Some(fresh) => Ok(Self(fresh)),
            None => {
                let _ = clear_shopify_customer_token(&session).await;
                Err(ShopifyCustomerRejection::for_request(parts))
            }
        }
    }
}

/// Exchange the refresh token for a new access token and store it.
async fn refresh(
    state: &AppState,
    session: &Session,
    expired: CustomerAccessToken,
) -> Option<CustomerAccessToken> {
    let refresh_token = expired.refresh_token.as_deref()?;

    let mut fresh = match state.customer().refresh_token(refresh_token).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "Customer token refresh failed");
            return None;
        }
    };

    // Shopify may omit tokens that did not rotate
    if fresh.refresh_token.is_none() {
        fresh.refresh_token = expired.refresh_token;
    }
    if fresh.id_token.is_none() {
        fresh.id_token = expired.id_token;
    }

    if let Err(e) = set_shopify_customer_token(session, &fresh).await {
        tracing::error!(error = %e, "Failed to store refreshed customer token");
        return None;
    }

    tracing::debug!("Refreshed customer access token");
    Some(fresh)
}

/// Extractor that optionally gets the Shopify customer token.
///
/// Unlike `RequireShopifyCustomer`, this never rejects and never refreshes.
pub struct OptionalShopifyCustomer(pub Option<CustomerAccessToken>);

impl<S> FromRequestParts<S> for OptionalShopifyCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CustomerAccessToken>(session_keys::SHOPIFY_CUSTOMER_TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(token))
    }
}

/// Store the Shopify customer token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_shopify_customer_token(
    session: &Session,
    token: &CustomerAccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::SHOPIFY_CUSTOMER_TOKEN, token)
        .await
}

/// Remove the Shopify customer token from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_shopify_customer_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerAccessToken>(session_keys::SHOPIFY_CUSTOMER_TOKEN)
        .await?;
    Ok(())
}
