//! Order history and order detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use novabox_core::ShopifyGid;
use tower_sessions::Session;
use tracing::instrument;

use super::{AccountError, AccountNav, AccountSection, guard, load_customer, private};
use crate::filters;
use crate::middleware::{CspNonce, RequireShopifyCustomer};
use crate::shopify::customer::{OrderDetail, OrderLineItem, OrderSummary};
use crate::shopify::types::PageRequest;
use crate::state::AppState;
use crate::views::{ImageView, Layout, PaginationView};

/// Status badge.
#[derive(Clone)]
pub struct BadgeView {
    pub label: &'static str,
    pub class: &'static str,
}

/// Order history row.
#[derive(Clone)]
pub struct OrderRowView {
    pub number: i64,
    pub date: String,
    pub financial_status: Option<BadgeView>,
    pub fulfillment_status: BadgeView,
    pub total: String,
    pub url: String,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(order: &OrderSummary) -> Self {
        let fulfillment = order.fulfillment_status();
        Self {
            number: order.number,
            date: order.processed_date(),
            financial_status: order.financial_status.map(|s| BadgeView {
                label: s.label(),
                class: s.tone().css_class(),
            }),
            fulfillment_status: BadgeView {
                label: fulfillment.label(),
                class: fulfillment.tone().css_class(),
            },
            total: order.total_price.display(),
            url: format!("/account/orders/{}", order.url_token()),
        }
    }
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderLineView {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub price: String,
    pub image: Option<ImageView>,
}

impl From<&OrderLineItem> for OrderLineView {
    fn from(item: &OrderLineItem) -> Self {
        Self {
            title: item.title.clone(),
            variant_title: item.display_variant_title().map(str::to_owned),
            quantity: item.quantity,
            price: item
                .price
                .as_ref()
                .map_or_else(String::new, crate::shopify::Money::display),
            image: item
                .image
                .as_ref()
                .map(|img| ImageView::sized(img, &item.title, 160)),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub nav: AccountNav,
    pub orders: Vec<OrderRowView>,
    pub pagination: PaginationView,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub nav: AccountNav,
    pub name: String,
    pub date: String,
    pub status: BadgeView,
    pub lines: Vec<OrderLineView>,
    pub subtotal: Option<String>,
    pub discount: Option<String>,
    pub tax: Option<String>,
    pub total: String,
    pub shipping_name: Option<String>,
    pub shipping_address: Vec<String>,
    pub status_page_url: Option<String>,
}

impl OrderTemplate {
    fn new(layout: Layout, nav: AccountNav, order: OrderDetail) -> Self {
        let status = order.fulfillment_status();
        Self {
            layout,
            nav,
            date: order.processed_date(),
            status: BadgeView {
                label: status.label(),
                class: status.tone().css_class(),
            },
            lines: order.line_items.iter().map(OrderLineView::from).collect(),
            subtotal: order.subtotal.as_ref().map(crate::shopify::Money::display),
            discount: order.discount(),
            tax: order.total_tax.as_ref().map(crate::shopify::Money::display),
            total: order.total_price.display(),
            shipping_name: order.shipping_address.as_ref().and_then(|a| a.name.clone()),
            shipping_address: order
                .shipping_address
                .map(|a| a.formatted)
                .unwrap_or_default(),
            status_page_url: order.status_page_url,
            name: order.name,
        }
    }
}

/// Display order history.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Query(page): Query<PageRequest>,
) -> Result<Response, AccountError> {
    let (customer, orders) = tokio::join!(
        load_customer(&state, &session, &token.access_token),
        state.customer().get_orders(&token.access_token, &page),
    );
    let customer = customer?;
    let orders = guard(&session, orders).await?;

    Ok(private(OrdersTemplate {
        layout: Layout::new(&state, nonce, "Orders"),
        nav: AccountNav::new(&customer, AccountSection::Orders),
        orders: orders.orders.iter().map(OrderRowView::from).collect(),
        pagination: PaginationView::from_page_info(&orders.page_info, "/account/orders", ""),
    }))
}

/// Display one order.
///
/// A token that does not decode to an order id sends the visitor back to
/// the history; an unknown order is a 404.
#[instrument(skip(state, session, nonce, token))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(order_token): Path<String>,
) -> Result<Response, AccountError> {
    let Some(gid) = ShopifyGid::from_url_token(&order_token)
        .ok()
        .filter(|gid| gid.is("Order"))
    else {
        tracing::debug!("Invalid order token");
        return Ok(Redirect::to("/account/orders").into_response());
    };

    let (customer, order) = tokio::join!(
        load_customer(&state, &session, &token.access_token),
        state.customer().get_order(&token.access_token, gid.as_str()),
    );
    let customer = customer?;
    let order = guard(&session, order).await?;

    let layout = Layout::new(&state, nonce, &format!("Order {}", order.name));
    Ok(private(OrderTemplate::new(
        layout,
        AccountNav::new(&customer, AccountSection::Orders),
        order,
    )))
}
