//! Conversions from backend wire types to `tidewater_core` types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::warn;

use tidewater_core::{
    Cart, CartItem, Category, Order, OrderCustomer, OrderId, OrderItem, OrderPricing,
    OrderStatus, PaymentMethod, Price, Product, ProductId, ProductPage, Quantity, UserId,
    product::PLACEHOLDER_IMAGE,
};

use super::AuthenticatedUser;
use super::types::{
    ApiAddress, ApiCategory, ApiLineItem, ApiOrder, ApiProduct, ListEnvelope, LoginResponse,
    RawCategory, RawProductRef, pick_id,
};

// =============================================================================
// Products
// =============================================================================

/// Convert a product. Products without an id are dropped.
pub fn convert_product(raw: ApiProduct) -> Option<Product> {
    let Some(id) = pick_id(raw.mongo_id, raw.id) else {
        warn!(name = %raw.name, "Dropping product without an id");
        return None;
    };

    let image = raw
        .image
        .filter(|i| !i.trim().is_empty())
        .or_else(|| raw.images.into_iter().find(|i| !i.trim().is_empty()))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let stock = raw.stock.or(raw.count_in_stock).unwrap_or(0);

    Some(Product {
        id: ProductId::new(id),
        name: raw.name,
        description: raw.description,
        price: Price::from(raw.price.unwrap_or(Decimal::ZERO)),
        category: raw.category.and_then(convert_category),
        image,
        stock: u32::try_from(stock.max(0)).unwrap_or(u32::MAX),
        rating: raw.rating.unwrap_or(0.0),
        review_count: raw.num_reviews.unwrap_or(0),
        features: raw
            .features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
    })
}

/// Convert a product list response into a page.
pub fn convert_product_page(envelope: ListEnvelope<ApiProduct>) -> ProductPage {
    let (items, total) = envelope.into_parts();
    ProductPage {
        products: items.into_iter().filter_map(convert_product).collect(),
        total,
    }
}

/// Normalise a category of any shape.
///
/// Objects use `slug`, `name`, `title`, `category`, `_id`, `id` (first
/// present wins) as the key and `name`, `title`, `slug`, `category`, `_id`,
/// `id` as the label. Arrays use their first usable element.
pub fn convert_category(raw: RawCategory) -> Option<Category> {
    match raw {
        RawCategory::Name(name) => Category::from_label(&name),
        RawCategory::Object(object) => convert_category_object(object),
        RawCategory::List(list) => list.into_iter().find_map(convert_category),
    }
}

fn convert_category_object(object: ApiCategory) -> Option<Category> {
    let ApiCategory {
        slug,
        name,
        title,
        category,
        mongo_id,
        id,
    } = object;
    let mongo_id = mongo_id.and_then(|i| i.into_string());
    let id = id.and_then(|i| i.into_string());

    let first = |candidates: [&Option<String>; 6]| {
        candidates
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
    };

    let key = first([&slug, &name, &title, &category, &mongo_id, &id])?;
    let label = first([&name, &title, &slug, &category, &mongo_id, &id]).unwrap_or_default();
    Category::new(&key, &label)
}

// =============================================================================
// Cart and order lines
// =============================================================================

/// Fields shared by cart and order lines after resolving the product reference.
struct ResolvedLine {
    product_id: Option<String>,
    name: String,
    price: Decimal,
    quantity: u32,
    image: String,
}

fn resolve_line(raw: ApiLineItem) -> ResolvedLine {
    let (ref_id, populated) = match raw.product {
        Some(RawProductRef::Id(id)) => (id.into_string(), None),
        Some(RawProductRef::Product(product)) => {
            let product = *product;
            let id = pick_id(product.mongo_id.clone(), product.id.clone());
            (id, Some(product))
        }
        None => (None, None),
    };

    let product_id = raw.product_id.and_then(|i| i.into_string()).or(ref_id);
    let name = raw
        .name
        .or_else(|| populated.as_ref().map(|p| p.name.clone()))
        .unwrap_or_default();
    let price = raw
        .price
        .or_else(|| populated.as_ref().and_then(|p| p.price))
        .unwrap_or(Decimal::ZERO);
    let image = raw
        .image
        .or_else(|| populated.as_ref().and_then(|p| p.image.clone()))
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    ResolvedLine {
        product_id,
        name,
        price,
        quantity: raw.quantity.or(raw.qty).unwrap_or(1),
        image,
    }
}

/// Convert cart lines into a snapshot.
///
/// Lines without a product id or with a zero quantity are dropped;
/// duplicate products are merged.
pub fn convert_cart(lines: Vec<ApiLineItem>) -> Cart {
    Cart::from_lines(lines.into_iter().filter_map(|raw| {
        let line = resolve_line(raw);
        let Some(product_id) = line.product_id else {
            warn!(name = %line.name, "Dropping cart line without a product id");
            return None;
        };
        let quantity = Quantity::new(line.quantity).ok()?;
        Some(CartItem {
            product_id: ProductId::new(product_id),
            name: line.name,
            price: Price::from(line.price),
            quantity,
            image: line.image,
        })
    }))
}

fn convert_order_item(raw: ApiLineItem) -> OrderItem {
    let line = resolve_line(raw);
    OrderItem {
        product_id: line.product_id.map(ProductId::new),
        name: line.name,
        quantity: line.quantity,
        price: Price::from(line.price),
        image: line.image,
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Convert an order. Orders without an id are dropped.
pub fn convert_order(raw: ApiOrder) -> Option<Order> {
    let Some(id) = pick_id(raw.mongo_id, raw.id) else {
        warn!("Dropping order without an id");
        return None;
    };

    let lines = if raw.items.is_empty() {
        raw.order_items
    } else {
        raw.items
    };
    let items: Vec<OrderItem> = lines.into_iter().map(convert_order_item).collect();

    let subtotal = raw
        .items_price
        .map_or_else(|| items.iter().map(OrderItem::line_total).sum(), Price::from);
    let derived = OrderPricing::from_subtotal(subtotal);
    let pricing = OrderPricing {
        subtotal,
        shipping: raw.shipping_price.map_or(derived.shipping, Price::from),
        tax: raw.tax_price.map_or(derived.tax, Price::from),
        total: raw.total_price.map_or(derived.total, Price::from),
    };

    let customer = raw
        .customer
        .map(|c| OrderCustomer {
            name: c.name,
            email: c.email,
            address: c.address,
            phone: c.phone,
        })
        .or_else(|| raw.shipping_address.map(customer_from_address));

    Some(Order {
        id: OrderId::new(id),
        items,
        customer,
        payment_method: raw
            .payment_method
            .as_deref()
            .and_then(|m| m.parse::<PaymentMethod>().ok()),
        pricing,
        status: raw
            .status
            .as_deref()
            .and_then(|s| s.parse::<OrderStatus>().ok())
            .unwrap_or_default(),
        is_paid: raw.is_paid,
        paid_at: raw.paid_at.as_deref().and_then(parse_timestamp),
        is_delivered: raw.is_delivered,
        delivered_at: raw.delivered_at.as_deref().and_then(parse_timestamp),
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
    })
}

fn customer_from_address(address: ApiAddress) -> OrderCustomer {
    let one_line = [
        address.address.as_str(),
        address.city.as_str(),
        format!("{} {}", address.state, address.zip_code).trim(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ");

    OrderCustomer {
        name: address.name,
        email: address.email,
        address: one_line,
        phone: address.phone,
    }
}

/// Convert an order list response.
pub fn convert_orders(envelope: ListEnvelope<ApiOrder>) -> Vec<Order> {
    let (items, _) = envelope.into_parts();
    items.into_iter().filter_map(convert_order).collect()
}

// =============================================================================
// Auth
// =============================================================================

/// Convert a login response, preferring the nested `user` object.
pub fn convert_login(raw: LoginResponse, fallback_email: &str) -> Option<AuthenticatedUser> {
    let user = raw.user.unwrap_or(raw.inline);
    let id = pick_id(user.mongo_id, user.id)?;
    let email = user
        .email
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| fallback_email.to_string());
    let name = user
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Some(AuthenticatedUser {
        id: UserId::new(id),
        name,
        email,
        token: SecretString::from(raw.token),
    })
}

/// Parse an RFC 3339 timestamp, ignoring anything malformed.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
