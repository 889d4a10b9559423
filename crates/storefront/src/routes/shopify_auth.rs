//! Shopify Customer Account OAuth route handlers.
//!
//! Handles the OAuth flow for Shopify Customer Account authentication:
//! - Login: Redirects to Shopify's OAuth authorization page
//! - Callback: Handles the OAuth callback and exchanges code for tokens
//! - Logout: Clears the Shopify customer token and redirects to Shopify logout

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{
    OptionalShopifyCustomer, clear_shopify_customer_token, set_shopify_customer_token,
};
use crate::models::session_keys;
use crate::state::AppState;

/// OAuth callback path registered with Shopify.
pub const CALLBACK_PATH: &str = "/account/authorize";

/// Query parameters from Shopify OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Random alphanumeric string for OAuth state and nonce values.
fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    tracing::error!("Session write failed during login: {e}");
    AppError::Internal("session unavailable".to_owned())
}

/// Initiate Shopify Customer Account OAuth login.
///
/// Generates state and nonce parameters, stores them in the session,
/// and redirects to Shopify's authorization page.
///
/// # Route
///
/// `GET /account/login`
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let oauth_state = generate_random_string(32);
    let nonce = generate_random_string(32);

    session
        .insert(session_keys::SHOPIFY_OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| session_error(&e))?;
    session
        .insert(session_keys::SHOPIFY_OAUTH_NONCE, &nonce)
        .await
        .map_err(|e| session_error(&e))?;

    let redirect_uri = state.config().absolute_url(CALLBACK_PATH);
    let auth_url = state
        .customer()
        .authorization_url(&redirect_uri, &oauth_state, &nonce);

    Ok(Redirect::to(&auth_url).into_response())
}

/// Handle Shopify OAuth callback.
///
/// Validates the state parameter, exchanges the authorization code for tokens,
/// and stores the customer access token in the session.
///
/// # Route
///
/// `GET /account/authorize`
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("Shopify OAuth error: {error} - {description}");
        return Err(AppError::BadRequest(
            "Sign in was cancelled or denied.".to_owned(),
        ));
    }

    let Some(code) = query.code else {
        tracing::warn!("Shopify OAuth callback missing code");
        return Err(AppError::BadRequest("Missing authorization code.".to_owned()));
    };

    let Some(returned_state) = query.state else {
        tracing::warn!("Shopify OAuth callback missing state");
        return Err(AppError::BadRequest("Missing state parameter.".to_owned()));
    };

    let stored_state: Option<String> = session
        .get(session_keys::SHOPIFY_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    // One-time use, whether or not it matches
    let _ = session
        .remove::<String>(session_keys::SHOPIFY_OAUTH_STATE)
        .await;
    let _ = session
        .remove::<String>(session_keys::SHOPIFY_OAUTH_NONCE)
        .await;

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("Shopify OAuth state mismatch");
        return Err(AppError::BadRequest(
            "Your sign in link expired. Please try again.".to_owned(),
        ));
    }

    let redirect_uri = state.config().absolute_url(CALLBACK_PATH);
    let token = state
        .customer()
        .exchange_code(&code, &redirect_uri)
        .await
        .map_err(|e| {
            tracing::error!("Failed to exchange Shopify OAuth code: {e}");
            AppError::BadRequest("We couldn't complete sign in. Please try again.".to_owned())
        })?;

    set_shopify_customer_token(&session, &token)
        .await
        .map_err(|e| session_error(&e))?;

    tracing::info!("Shopify customer authenticated successfully");
    Ok(Redirect::to("/account").into_response())
}

/// Logout from Shopify Customer Account.
///
/// Clears the Shopify customer token from the session and redirects to
/// Shopify's logout endpoint when an id token is available.
///
/// # Route
///
/// `POST /account/logout`
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalShopifyCustomer(token): OptionalShopifyCustomer,
) -> Response {
    if let Err(e) = clear_shopify_customer_token(&session).await {
        tracing::warn!("Failed to clear customer token: {e}");
    }
    clear_sentry_user();

    if let Some(id_token) = token.and_then(|t| t.id_token) {
        let post_logout_uri = state.config().absolute_url("/");
        let logout_url = state.customer().logout_url(&id_token, &post_logout_uri);
        return Redirect::to(&logout_url).into_response();
    }

    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string() {
        let a = generate_random_string(32);
        let b = generate_random_string(32);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
