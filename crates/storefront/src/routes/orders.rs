//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tidewater_core::{Order, OrderFilter, OrderId, OrderStatus};

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::Notice;
use crate::routes::PageContext;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// A status tab.
#[derive(Clone)]
pub struct TabView {
    pub label: String,
    pub url: String,
    pub active: bool,
}

/// An order row in the history.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub short_id: String,
    /// RFC 3339, formatted by the `short_date` filter; empty when unknown.
    pub placed_at: String,
    pub status: String,
    pub status_class: String,
    pub total: Decimal,
    pub item_count: u32,
    pub previews: Vec<String>,
    pub hidden_count: usize,
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|dt| dt.to_rfc3339()).unwrap_or_default()
}

fn status_class(status: OrderStatus) -> String {
    format!("status--{}", status.as_str())
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.id.short().to_string(),
            placed_at: timestamp(order.created_at),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            total: order.pricing.total.amount(),
            item_count: order.items.iter().map(|item| item.quantity).sum(),
            previews: order
                .preview_items()
                .iter()
                .map(|item| item.image.clone())
                .collect(),
            hidden_count: order.hidden_item_count(),
        }
    }
}

/// A step on the order timeline.
#[derive(Clone)]
pub struct TimelineStepView {
    pub label: String,
    pub reached: bool,
}

/// An order line.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: Decimal,
    pub line_total: Decimal,
    pub product_url: Option<String>,
}

/// Full order detail.
#[derive(Clone)]
pub struct OrderDetailView {
    pub summary: OrderSummaryView,
    pub cancelled: bool,
    pub timeline: Vec<TimelineStepView>,
    pub items: Vec<OrderItemView>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_method: String,
    pub is_paid: bool,
    pub paid_at: String,
    pub is_delivered: bool,
    pub delivered_at: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let customer = order.customer.clone().unwrap_or_default();
        Self {
            summary: OrderSummaryView::from(order),
            cancelled: order.status == OrderStatus::Cancelled,
            timeline: OrderStatus::TIMELINE
                .iter()
                .map(|step| TimelineStepView {
                    label: step.label().to_string(),
                    reached: order.status.has_reached(*step),
                })
                .collect(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    image: item.image.clone(),
                    quantity: item.quantity,
                    price: item.price.amount(),
                    line_total: item.line_total().amount(),
                    product_url: item
                        .product_id
                        .as_ref()
                        .map(|id| format!("/products/{}", urlencoding::encode(id.as_str()))),
                })
                .collect(),
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            customer_address: customer.address,
            payment_method: order
                .payment_method
                .map(|method| method.label().to_string())
                .unwrap_or_default(),
            is_paid: order.is_paid,
            paid_at: timestamp(order.paid_at),
            is_delivered: order.is_delivered,
            delivered_at: timestamp(order.delivered_at),
            subtotal: order.pricing.subtotal.amount(),
            shipping: order.pricing.shipping.amount(),
            tax: order.pricing.tax.amount(),
        }
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<TabView>,
    pub orders: Vec<OrderSummaryView>,
    pub has_any_orders: bool,
    pub filter_label: String,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderDetailView,
}

fn tabs(active: OrderFilter) -> Vec<TabView> {
    OrderFilter::TABS
        .iter()
        .map(|tab| TabView {
            label: tab.label().to_string(),
            url: match tab {
                OrderFilter::All => "/orders".to_string(),
                OrderFilter::Status(_) => format!("/orders?status={}", tab.as_param()),
            },
            active: *tab == active,
        })
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the customer's orders, optionally filtered by status.
#[instrument(skip(state, customer, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ctx: PageContext,
    Query(query): Query<OrdersQuery>,
) -> impl IntoResponse {
    let filter = OrderFilter::parse(query.status.as_deref());

    let (orders, ctx) = match state.api().my_orders(&customer.access_token).await {
        Ok(orders) => (orders, ctx),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            let notice = Notice::error(e.user_message("Failed to load your orders"));
            (Vec::new(), ctx.with_notice(notice))
        }
    };

    OrdersIndexTemplate {
        ctx,
        tabs: tabs(filter),
        has_any_orders: !orders.is_empty(),
        orders: filter
            .apply(&orders)
            .into_iter()
            .map(OrderSummaryView::from)
            .collect(),
        filter_label: filter.label().to_lowercase(),
    }
}

/// Display one order.
#[instrument(skip(state, customer, ctx))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state
        .api()
        .get_order(&customer.access_token, &OrderId::new(id))
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => AppError::NotFound("that order".to_string()),
            other => AppError::Api(other),
        })?;

    Ok(OrderShowTemplate {
        ctx,
        order: OrderDetailView::from(&order),
    })
}
