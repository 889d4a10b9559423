//! Cart route handlers.
//!
//! Every cart mutation goes through `POST /cart` with a `cartAction` field
//! naming the operation. htmx requests get the re-rendered cart fragment and
//! an `HX-Trigger: cart-updated` header so the count badge refreshes; plain
//! form posts are redirected back. The Shopify cart id lives in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::CartSession;
use crate::routes::{is_htmx, same_site_path};
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLine, CartLineInput, CartLineUpdateInput, SelectedOption,
};
use crate::shopify::{ShopifyError, StorefrontClient};
use crate::state::AppState;
use crate::variants::variant_url;
use crate::views::{ImageView, Layout};

// =============================================================================
// View Models
// =============================================================================

/// Cart line display data.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub options: Vec<SelectedOption>,
    pub url: String,
    pub image: Option<ImageView>,
    pub line_total: String,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub next_quantity: i64,
    pub decrease_disabled: bool,
    /// Line not yet confirmed by Shopify; all controls are disabled.
    pub optimistic: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        let is_default = merchandise.title == "Default Title";
        let optimistic = !line.is_confirmed();

        Self {
            id: line.id.clone(),
            product_title: merchandise.product.title.clone(),
            variant_title: (!is_default).then(|| merchandise.title.clone()),
            options: if is_default {
                Vec::new()
            } else {
                merchandise.selected_options.clone()
            },
            url: variant_url(&merchandise.product.handle, &merchandise.selected_options),
            image: merchandise
                .image
                .as_ref()
                .map(|img| ImageView::sized(img, &merchandise.product.title, 200)),
            line_total: line.cost.total_amount.display(),
            quantity: line.quantity,
            previous_quantity: (line.quantity - 1).max(0),
            next_quantity: line.quantity + 1,
            decrease_disabled: line.quantity <= 1 || optimistic,
            optimistic,
        }
    }
}

/// Applied gift card display data.
#[derive(Clone)]
pub struct GiftCardView {
    pub last_characters: String,
    pub amount_used: String,
}

/// Cart display data.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub discount_codes: Vec<String>,
    pub gift_cards: Vec<GiftCardView>,
    pub note: String,
    pub checkout_url: String,
    pub total_quantity: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            subtotal: cart
                .cost
                .subtotal_amount
                .as_ref()
                .map_or_else(|| "-".to_owned(), crate::shopify::Money::display),
            discount_codes: cart
                .applicable_discount_codes()
                .map(|d| d.code.clone())
                .collect(),
            gift_cards: cart
                .applied_gift_cards
                .iter()
                .map(|g| GiftCardView {
                    last_characters: g.last_characters.clone(),
                    amount_used: g.amount_used.display(),
                })
                .collect(),
            note: cart.note.clone().unwrap_or_default(),
            checkout_url: cart.checkout_url.clone(),
            total_quantity: cart.total_quantity,
        }
    }
}

impl CartView {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart fragment template (for htmx).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart.html")]
pub struct CartFragmentTemplate {
    pub cart: Option<CartView>,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for htmx).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

// =============================================================================
// Cart Actions
// =============================================================================

/// Operation requested by a cart form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CartAction {
    LinesAdd,
    LinesUpdate,
    LinesRemove,
    DiscountCodesUpdate,
    GiftCardCodesUpdate,
    NoteUpdate,
    BuyerIdentityUpdate,
}

impl CartAction {
    /// Parse the `cartAction` form value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.to_owned())).ok()
    }
}

/// Cart form submission.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartForm {
    #[serde(default)]
    pub cart_action: String,
    pub merchandise_id: Option<String>,
    pub quantity: Option<i64>,
    pub line_id: Option<String>,
    pub discount_code: Option<String>,
    pub remove_discount_code: Option<String>,
    pub clear_discount_codes: Option<String>,
    pub gift_card_code: Option<String>,
    pub note: Option<String>,
    pub country_code: Option<String>,
    pub redirect_to: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {field}")))
}

/// Discount codes after applying the form's inputs, or `None` when the
/// submission changes nothing.
///
/// Only an explicit `clearDiscountCodes` removes every code.
fn next_discount_codes(
    current: &[String],
    add: Option<&str>,
    remove: Option<&str>,
    clear: bool,
) -> Option<Vec<String>> {
    if clear {
        return Some(Vec::new());
    }

    let add = add.map(str::trim).filter(|c| !c.is_empty());
    let remove = remove.map(str::trim).filter(|c| !c.is_empty());
    if add.is_none() && remove.is_none() {
        return None;
    }

    let mut codes: Vec<String> = current
        .iter()
        .filter(|c| remove.is_none_or(|r| !c.eq_ignore_ascii_case(r)))
        .cloned()
        .collect();
    if let Some(code) = add
        && !codes.iter().any(|c| c.eq_ignore_ascii_case(code))
    {
        codes.push(code.to_owned());
    }
    Some(codes)
}

/// Stored cart, or a fresh empty one when there is none (or it expired).
async fn current_or_new_cart(
    storefront: &StorefrontClient,
    cart_session: &CartSession<'_>,
) -> Result<Cart, ShopifyError> {
    if let Some(id) = cart_session.id().await
        && let Some(cart) = storefront.get_cart(&id).await?
    {
        return Ok(cart);
    }
    storefront.create_cart(Vec::new(), None).await
}

/// Add lines, creating a cart when none exists or the stored one is gone.
async fn add_lines(
    storefront: &StorefrontClient,
    cart_session: &CartSession<'_>,
    line: CartLineInput,
) -> Result<Cart, ShopifyError> {
    let Some(id) = cart_session.id().await else {
        return storefront.create_cart(vec![line], None).await;
    };

    match storefront.add_lines(&id, vec![line.clone()]).await {
        Ok(cart) => Ok(cart),
        Err(e) => match storefront.get_cart(&id).await {
            Ok(None) => {
                tracing::info!("Stored cart expired, creating a new one");
                storefront.create_cart(vec![line], None).await
            }
            _ => Err(e),
        },
    }
}

/// Run the requested cart action and return the updated cart.
async fn apply_action(
    storefront: &StorefrontClient,
    cart_session: &CartSession<'_>,
    action: CartAction,
    form: CartForm,
) -> Result<Cart, AppError> {
    let cart = match action {
        CartAction::LinesAdd => {
            let merchandise_id = required(form.merchandise_id, "merchandiseId")?;
            let quantity = form.quantity.unwrap_or(1);
            if quantity < 1 {
                return Err(AppError::BadRequest("Quantity must be at least 1".to_owned()));
            }
            add_breadcrumb("cart", "Add line", Some(&[("merchandise_id", merchandise_id.as_str())]));
            add_lines(
                storefront,
                cart_session,
                CartLineInput::new(merchandise_id, quantity),
            )
            .await?
        }
        CartAction::LinesUpdate => {
            let line_id = required(form.line_id, "lineId")?;
            let quantity = form
                .quantity
                .ok_or_else(|| AppError::BadRequest("Missing quantity".to_owned()))?;
            let cart_id = existing_cart_id(cart_session).await?;
            if quantity <= 0 {
                storefront.remove_lines(&cart_id, vec![line_id]).await?
            } else {
                storefront
                    .update_lines(
                        &cart_id,
                        vec![CartLineUpdateInput {
                            id: line_id,
                            quantity,
                        }],
                    )
                    .await?
            }
        }
        CartAction::LinesRemove => {
            let line_id = required(form.line_id, "lineId")?;
            let cart_id = existing_cart_id(cart_session).await?;
            storefront.remove_lines(&cart_id, vec![line_id]).await?
        }
        CartAction::DiscountCodesUpdate => {
            let cart = current_or_new_cart(storefront, cart_session).await?;
            let current: Vec<String> = cart
                .applicable_discount_codes()
                .map(|d| d.code.clone())
                .collect();
            let clear = form.clear_discount_codes.is_some_and(|v| !v.is_empty());
            match next_discount_codes(
                &current,
                form.discount_code.as_deref(),
                form.remove_discount_code.as_deref(),
                clear,
            ) {
                Some(codes) => storefront.update_discount_codes(&cart.id, codes).await?,
                None => cart,
            }
        }
        CartAction::GiftCardCodesUpdate => {
            let code = required(form.gift_card_code, "giftCardCode")?;
            let cart = current_or_new_cart(storefront, cart_session).await?;
            storefront
                .update_gift_card_codes(&cart.id, vec![code])
                .await?
        }
        CartAction::NoteUpdate => {
            let cart = current_or_new_cart(storefront, cart_session).await?;
            storefront
                .update_note(&cart.id, form.note.as_deref().unwrap_or_default())
                .await?
        }
        CartAction::BuyerIdentityUpdate => {
            let country_code = required(form.country_code, "countryCode")?.to_uppercase();
            let cart = current_or_new_cart(storefront, cart_session).await?;
            storefront
                .update_buyer_identity(
                    &cart.id,
                    CartBuyerIdentityInput {
                        country_code: Some(country_code),
                        customer_access_token: None,
                    },
                )
                .await?
        }
    };

    Ok(cart)
}

async fn existing_cart_id(cart_session: &CartSession<'_>) -> Result<String, AppError> {
    cart_session
        .id()
        .await
        .ok_or_else(|| AppError::BadRequest("Your cart is empty".to_owned()))
}

/// Load the visitor's cart, forgetting ids Shopify no longer knows.
async fn load_cart(state: &AppState, cart_session: &CartSession<'_>) -> Option<Cart> {
    let id = cart_session.id().await?;
    match state.storefront().get_cart(&id).await {
        Ok(Some(cart)) => Some(cart),
        Ok(None) => {
            if let Err(e) = cart_session.clear().await {
                tracing::warn!("Failed to clear expired cart id: {e}");
            }
            None
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart {id}: {e}");
            None
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(State(state): State<AppState>, session: Session, nonce: CspNonce) -> Response {
    let cart = load_cart(&state, &CartSession(&session)).await;

    (
        AppendHeaders([("cache-control", super::NO_STORE)]),
        CartShowTemplate {
            layout: Layout::new(&state, nonce, "Cart"),
            cart: cart.as_ref().map(CartView::from),
            error: None,
        },
    )
        .into_response()
}

/// Apply a cart action.
///
/// API user errors (invalid discount code, sold-out variant) are rendered in
/// the cart rather than as an error page.
#[instrument(skip(state, session, nonce, headers, form), fields(action = %form.cart_action))]
pub async fn action(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    headers: HeaderMap,
    Form(form): Form<CartForm>,
) -> Result<Response, AppError> {
    let Some(action) = CartAction::parse(&form.cart_action) else {
        return Err(AppError::BadRequest(format!(
            "Unknown cart action: {}",
            form.cart_action
        )));
    };

    let htmx = is_htmx(&headers);
    let redirect_to = form
        .redirect_to
        .as_deref()
        .and_then(same_site_path)
        .unwrap_or("/cart")
        .to_owned();
    let cart_session = CartSession(&session);

    match apply_action(state.storefront(), &cart_session, action, form).await {
        Ok(cart) => {
            if let Err(e) = cart_session.set_id(&cart.id).await {
                tracing::error!("Failed to save cart ID to session: {e}");
            }

            if htmx {
                Ok((
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartFragmentTemplate {
                        cart: Some(CartView::from(&cart)),
                        error: None,
                    },
                )
                    .into_response())
            } else {
                Ok(Redirect::to(&redirect_to).into_response())
            }
        }
        Err(AppError::Shopify(ShopifyError::UserError(message)) | AppError::BadRequest(message)) => {
            tracing::info!(%message, "Cart action rejected");
            let cart = load_cart(&state, &cart_session)
                .await
                .as_ref()
                .map(CartView::from);

            if htmx {
                Ok(CartFragmentTemplate {
                    cart,
                    error: Some(message),
                }
                .into_response())
            } else {
                Ok((
                    StatusCode::BAD_REQUEST,
                    CartShowTemplate {
                        layout: Layout::new(&state, nonce, "Cart"),
                        cart,
                        error: Some(message),
                    },
                )
                    .into_response())
            }
        }
        Err(e) => Err(e),
    }
}

/// Get cart count badge (htmx).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let count = load_cart(&state, &CartSession(&session))
        .await
        .map_or(0, |cart| cart.total_quantity);

    CartCountTemplate { count }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    match load_cart(&state, &CartSession(&session)).await {
        Some(cart) if !cart.is_empty() => Redirect::to(&cart.checkout_url).into_response(),
        _ => Redirect::to("/cart").into_response(),
    }
}

/// Permalink query parameters.
#[derive(Debug, Deserialize)]
pub struct PermalinkQuery {
    pub discount: Option<String>,
}

/// Parse `variantId:qty,variantId:qty` into cart lines.
///
/// Ids may be numeric or full `ProductVariant` gids; a missing quantity
/// means one.
fn parse_permalink_lines(lines: &str) -> Result<Vec<CartLineInput>, AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid cart permalink: {lines}"));

    lines
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (id, quantity) = part.split_once(':').unwrap_or((part, "1"));
            let quantity: i64 = quantity.parse().map_err(|_| invalid())?;
            if quantity < 1 {
                return Err(invalid());
            }

            let merchandise_id = if id.starts_with("gid://") {
                id.to_owned()
            } else if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                format!("gid://shopify/ProductVariant/{id}")
            } else {
                return Err(invalid());
            };

            Ok(CartLineInput::new(merchandise_id, quantity))
        })
        .collect::<Result<Vec<_>, _>>()
        .and_then(|parsed| if parsed.is_empty() { Err(invalid()) } else { Ok(parsed) })
}

/// Cart permalink: build a cart from the path and go straight to checkout.
#[instrument(skip(state, session))]
pub async fn permalink(
    State(state): State<AppState>,
    session: Session,
    Path(lines): Path<String>,
    Query(query): Query<PermalinkQuery>,
) -> Result<Response, AppError> {
    let lines = parse_permalink_lines(&lines)?;
    let storefront = state.storefront();

    let mut cart = storefront.create_cart(lines, None).await?;
    if let Some(code) = query.discount.filter(|c| !c.trim().is_empty()) {
        cart = storefront
            .update_discount_codes(&cart.id, vec![code.trim().to_owned()])
            .await?;
    }

    if let Err(e) = CartSession(&session).set_id(&cart.id).await {
        tracing::error!("Failed to save cart ID to session: {e}");
    }

    Ok(Redirect::to(&cart.checkout_url).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::{CartLineCost, CartMerchandise, CartMerchandiseProduct, Money};

    fn line(id: &str, quantity: i64, title: &str) -> CartLine {
        let money = Money {
            amount: "10.0".to_string(),
            currency_code: "USD".to_string(),
        };
        CartLine {
            id: id.to_string(),
            quantity,
            cost: CartLineCost {
                amount_per_quantity: money.clone(),
                compare_at_amount_per_quantity: None,
                total_amount: money.clone(),
            },
            merchandise: CartMerchandise {
                id: "gid://shopify/ProductVariant/1".to_string(),
                title: title.to_string(),
                available_for_sale: true,
                price: money,
                compare_at_price: None,
                selected_options: vec![SelectedOption::new("Size", "M")],
                image: None,
                product: CartMerchandiseProduct {
                    id: "gid://shopify/Product/1".to_string(),
                    handle: "nova-box".to_string(),
                    title: "Nova Box".to_string(),
                    vendor: String::new(),
                },
            },
        }
    }

    #[test]
    fn test_quantity_controls() {
        let single = CartLineView::from(&line("gid://shopify/CartLine/1", 1, "M"));
        assert!(single.decrease_disabled);
        assert_eq!(single.previous_quantity, 0);
        assert_eq!(single.next_quantity, 2);
        assert!(!single.optimistic);

        let several = CartLineView::from(&line("gid://shopify/CartLine/2", 3, "M"));
        assert!(!several.decrease_disabled);
        assert_eq!(several.previous_quantity, 2);
        assert_eq!(several.url, "/products/nova-box?Size=M");
    }

    #[test]
    fn test_optimistic_line_disables_controls() {
        let view = CartLineView::from(&line("optimistic-abc", 4, "M"));
        assert!(view.optimistic);
        assert!(view.decrease_disabled);
    }

    #[test]
    fn test_default_title_hides_variant() {
        let view = CartLineView::from(&line("gid://shopify/CartLine/1", 1, "Default Title"));
        assert!(view.variant_title.is_none());
        assert!(view.options.is_empty());
    }

    #[test]
    fn test_cart_action_parse() {
        assert_eq!(CartAction::parse("LinesAdd"), Some(CartAction::LinesAdd));
        assert_eq!(
            CartAction::parse("DiscountCodesUpdate"),
            Some(CartAction::DiscountCodesUpdate)
        );
        assert_eq!(CartAction::parse("Checkout"), None);
        assert_eq!(CartAction::parse(""), None);
    }

    #[test]
    fn test_next_discount_codes() {
        let current = vec!["SAVE10".to_string()];
        assert_eq!(
            next_discount_codes(&current, Some("FREESHIP"), None, false),
            Some(vec!["SAVE10".to_string(), "FREESHIP".to_string()])
        );
        assert_eq!(
            next_discount_codes(&current, Some("save10"), None, false),
            Some(vec!["SAVE10".to_string()])
        );
        assert_eq!(
            next_discount_codes(&current, None, Some("SAVE10"), false),
            Some(Vec::new())
        );
        assert_eq!(next_discount_codes(&current, None, None, true), Some(Vec::new()));
    }

    #[test]
    fn test_blank_discount_code_keeps_codes() {
        let current = vec!["SAVE10".to_string()];
        assert_eq!(next_discount_codes(&current, Some("  "), None, false), None);
        assert_eq!(next_discount_codes(&current, None, None, false), None);
    }

    #[test]
    fn test_parse_permalink_lines() {
        let lines = parse_permalink_lines("123:2,456").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().unwrap().merchandise_id, "gid://shopify/ProductVariant/123");
        assert_eq!(lines.first().unwrap().quantity, 2);
        assert_eq!(lines.get(1).unwrap().quantity, 1);

        assert!(parse_permalink_lines("abc:1").is_err());
        assert!(parse_permalink_lines("123:0").is_err());
        assert!(parse_permalink_lines("").is_err());
    }
}
