//! Orders: the request the storefront submits and the record the backend keeps.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::checkout::ShippingInfo;
use crate::pricing::OrderPricing;
use crate::types::{OrderId, OrderStatus, PaymentMethod, Price, ProductId};

/// Number of item thumbnails shown per order in the order history.
pub const PREVIEW_ITEMS: usize = 3;

/// Contact details attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    /// One-line postal address.
    pub address: String,
    pub phone: String,
}

impl OrderCustomer {
    /// Contact details from a validated shipping form.
    #[must_use]
    pub fn from_shipping(shipping: &ShippingInfo) -> Self {
        Self {
            name: shipping.name.clone(),
            email: shipping.email.clone(),
            address: shipping.one_line_address(),
            phone: shipping.phone.clone(),
        }
    }
}

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequestItem {
    pub product: ProductId,
    pub name: String,
    pub qty: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

/// Payload for `POST /orders`.
///
/// Prices are sent as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer: OrderCustomer,
    pub shipping_address: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub order_items: Vec<OrderRequestItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub items_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl OrderRequest {
    /// Aggregate cart, shipping details and payment choice into a request.
    ///
    /// The caller is responsible for having validated `shipping`.
    #[must_use]
    pub fn build(shipping: &ShippingInfo, payment_method: PaymentMethod, cart: &Cart) -> Self {
        let pricing = cart.pricing();
        Self {
            customer: OrderCustomer::from_shipping(shipping),
            shipping_address: shipping.clone(),
            payment_method,
            order_items: cart
                .items()
                .iter()
                .map(|item| OrderRequestItem {
                    product: item.product_id.clone(),
                    name: item.name.clone(),
                    qty: item.quantity.get(),
                    price: item.price.amount(),
                    image: item.image.clone(),
                })
                .collect(),
            items_price: pricing.subtotal.amount(),
            shipping_price: pricing.shipping.amount(),
            tax_price: pricing.tax.amount(),
            total_price: pricing.total.amount(),
        }
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub image: String,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// An order as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub customer: Option<OrderCustomer>,
    pub payment_method: Option<PaymentMethod>,
    pub pricing: OrderPricing,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of line totals.
    #[must_use]
    pub fn items_subtotal(&self) -> Price {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Items shown as thumbnails in a list.
    #[must_use]
    pub fn preview_items(&self) -> &[OrderItem] {
        self.items.get(..PREVIEW_ITEMS).unwrap_or(&self.items)
    }

    /// Number of items not shown in the preview.
    #[must_use]
    pub fn hidden_item_count(&self) -> usize {
        self.items.len().saturating_sub(PREVIEW_ITEMS)
    }
}

/// Status tab on the order history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    Status(OrderStatus),
}

impl OrderFilter {
    /// Tabs in display order. Cancelled orders only show under "All".
    pub const TABS: [Self; 5] = [
        Self::All,
        Self::Status(OrderStatus::Pending),
        Self::Status(OrderStatus::Processing),
        Self::Status(OrderStatus::Shipped),
        Self::Status(OrderStatus::Delivered),
    ];

    /// Parse a `?status=` value; unknown values fall back to "All".
    #[must_use]
    pub fn parse(input: Option<&str>) -> Self {
        input
            .and_then(|s| s.parse::<OrderStatus>().ok())
            .map_or(Self::All, Self::Status)
    }

    /// Query-string value.
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Status(status) => status.as_str(),
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All Orders",
            Self::Status(status) => status.label(),
        }
    }

    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => order.status == *status,
        }
    }

    /// Orders passing the filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }
}
