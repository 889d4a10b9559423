//! Customer profile (name) editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AccountError, AccountNav, AccountSection, api_error, load_customer, private};
use crate::filters;
use crate::middleware::{CspNonce, RequireShopifyCustomer};
use crate::shopify::ShopifyError;
use crate::shopify::customer::{Customer, CustomerUpdateInput};
use crate::state::AppState;
use crate::views::Layout;

/// Profile form submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl ProfileForm {
    fn into_input(self) -> CustomerUpdateInput {
        let field = |v: String| Some(v.trim().to_owned());
        CustomerUpdateInput {
            first_name: field(self.first_name),
            last_name: field(self.last_name),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub nav: AccountNav,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl ProfileTemplate {
    fn new(layout: Layout, customer: &Customer) -> Self {
        Self {
            layout,
            nav: AccountNav::new(customer, AccountSection::Profile),
            first_name: customer.first_name.clone().unwrap_or_default(),
            last_name: customer.last_name.clone().unwrap_or_default(),
            email: customer.email().unwrap_or_default().to_owned(),
            notice: None,
            error: None,
        }
    }
}

/// Display the profile form.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<Response, AccountError> {
    let customer = load_customer(&state, &session, &token.access_token).await?;

    Ok(private(ProfileTemplate::new(
        Layout::new(&state, nonce, "Profile"),
        &customer,
    )))
}

/// Update the customer's name.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AccountError> {
    let layout = Layout::new(&state, nonce, "Profile");

    let result = state
        .customer()
        .update_customer(&token.access_token, form.into_input())
        .await;

    match result {
        Ok(customer) => {
            tracing::info!("Customer profile updated");
            let mut page = ProfileTemplate::new(layout, &customer);
            page.notice = Some("Profile updated".to_owned());
            Ok(private(page))
        }
        Err(e @ (ShopifyError::UserError(_) | ShopifyError::GraphQL(_))) => {
            tracing::warn!("Profile update rejected: {e}");
            let customer = load_customer(&state, &session, &token.access_token).await?;
            let mut page = ProfileTemplate::new(layout, &customer);
            page.error = Some(match e {
                ShopifyError::UserError(message) => message,
                other => other.to_string(),
            });
            Ok(private((StatusCode::BAD_REQUEST, page)))
        }
        Err(e) => Err(api_error(&session, e).await),
    }
}
