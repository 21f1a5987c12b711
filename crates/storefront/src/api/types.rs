//! Wire types for the Tidewater backend.
//!
//! The backend is loose about shapes: ids arrive as `_id` or `id`, strings
//! or numbers; lists may be bare arrays or wrapped in `{ data, total }`;
//! categories may be strings, objects or arrays. Everything here is
//! deliberately permissive and is narrowed into `tidewater_core` types by
//! the conversions module.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelopes
// =============================================================================

/// A list response, bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Data {
        data: Vec<T>,
        total: Option<u64>,
    },
    Products {
        products: Vec<T>,
        total: Option<u64>,
    },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    /// Split into items and the reported total, falling back to the item count.
    pub fn into_parts(self) -> (Vec<T>, u64) {
        let (items, total) = match self {
            Self::Data { data, total } => (data, total),
            Self::Products { products, total } => (products, total),
            Self::Bare(items) => (items, None),
        };
        let fallback = u64::try_from(items.len()).unwrap_or(u64::MAX);
        let total = total.filter(|t| *t > 0).unwrap_or(fallback);
        (items, total)
    }
}

/// A single-object response, bare or wrapped in `{ data }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemEnvelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> ItemEnvelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Error body: `{ "error": ... }` or `{ "message": ... }`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The most specific non-blank message.
    pub fn into_message(self) -> Option<String> {
        self.error
            .into_iter()
            .chain(self.message)
            .map(|m| m.trim().to_string())
            .find(|m| !m.is_empty())
    }
}

// =============================================================================
// Scalars
// =============================================================================

/// An identifier that may be a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    /// String form, or `None` when blank.
    pub fn into_string(self) -> Option<String> {
        let value = match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(n) => n.to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Pick `_id` over `id`.
pub fn pick_id(mongo_id: Option<RawId>, id: Option<RawId>) -> Option<String> {
    mongo_id
        .and_then(RawId::into_string)
        .or_else(|| id.and_then(RawId::into_string))
}

// =============================================================================
// Products
// =============================================================================

/// A category in any of the shapes the backend produces.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCategory {
    Name(String),
    List(Vec<RawCategory>),
    Object(ApiCategory),
}

/// Category object. Any subset of these fields may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCategory {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "_id")]
    pub mongo_id: Option<RawId>,
    pub id: Option<RawId>,
}

/// A product as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    #[serde(rename = "_id")]
    pub mongo_id: Option<RawId>,
    pub id: Option<RawId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    pub category: Option<RawCategory>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock: Option<i64>,
    pub count_in_stock: Option<i64>,
    pub rating: Option<f64>,
    pub num_reviews: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: Option<String>,
}

// =============================================================================
// Cart and order lines
// =============================================================================

/// A line's product: an id, or the populated product document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawProductRef {
    Id(RawId),
    Product(Box<ApiProduct>),
}

/// A cart or order line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLineItem {
    pub product: Option<RawProductRef>,
    pub product_id: Option<RawId>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub qty: Option<u32>,
    pub image: Option<String>,
}

/// Cart body: an object with `items`, or a bare line array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CartBody {
    Cart {
        #[serde(default)]
        items: Vec<ApiLineItem>,
    },
    Lines(Vec<ApiLineItem>),
}

impl CartBody {
    /// Parse a cart response, unwrapping any `{ data }` layers first.
    ///
    /// Not an [`ItemEnvelope`]: a bare line array would otherwise be read as
    /// a wrapped cart whose first line is the whole cart.
    pub fn from_value(mut value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if let serde_json::Value::Object(map) = &mut value
            && let Some(data) = map.remove("data")
        {
            return Self::from_value(data);
        }
        serde_json::from_value(value)
    }

    pub fn into_lines(self) -> Vec<ApiLineItem> {
        match self {
            Self::Cart { items } | Self::Lines(items) => items,
        }
    }
}

/// `POST /cart`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

/// `PUT /cart/{productId}`
#[derive(Debug, Serialize)]
pub struct UpdateCartRequest {
    pub quantity: u32,
}

// =============================================================================
// Orders
// =============================================================================

/// Contact block on an order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiOrderCustomer {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// Shipping address as stored on an order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiAddress {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// An order as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
    #[serde(rename = "_id")]
    pub mongo_id: Option<RawId>,
    pub id: Option<RawId>,
    #[serde(default)]
    pub items: Vec<ApiLineItem>,
    #[serde(default)]
    pub order_items: Vec<ApiLineItem>,
    pub customer: Option<ApiOrderCustomer>,
    pub shipping_address: Option<ApiAddress>,
    pub payment_method: Option<String>,
    pub items_price: Option<Decimal>,
    pub shipping_price: Option<Decimal>,
    pub tax_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub status: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    pub paid_at: Option<String>,
    #[serde(default)]
    pub is_delivered: bool,
    pub delivered_at: Option<String>,
    pub created_at: Option<String>,
}

/// Payment confirmation sent to `PUT /orders/{id}/pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: String,
    pub email_address: String,
}

// =============================================================================
// Auth
// =============================================================================

/// `POST /auth/login`
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// User fields, nested under `user` or inlined next to the token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
    #[serde(rename = "_id")]
    pub mongo_id: Option<RawId>,
    pub id: Option<RawId>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Login response: `{ token, user }` or `{ token, _id, name, email }`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Option<ApiUser>,
    #[serde(flatten)]
    pub inline: ApiUser,
}
