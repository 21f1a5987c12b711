//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Successful changes fire a `cart-updated` event so the header badge
//! refreshes itself. Without JavaScript the forms post normally and are
//! redirected back with a notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tidewater_core::{Cart, Product, ProductId, Quantity, QuantityError};

use crate::filters;
use crate::middleware::{OptionalCustomer, RequireCustomer, is_htmx};
use crate::models::{CartSnapshot, Notice};
use crate::routes::PageContext;
use crate::services::{CartStore, push_notice};
use crate::state::AppState;

/// Event fired for HTMX listeners after the cart changed.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub decrease_to: Option<u32>,
    pub increase_to: u32,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub free_shipping: bool,
    /// How much more to spend for free shipping.
    pub free_shipping_gap: Option<Decimal>,
    pub last_error: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, last_error: Option<String>) -> Self {
        let pricing = cart.pricing();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    image: item.image.clone(),
                    price: item.price.amount(),
                    quantity: item.quantity.get(),
                    line_total: item.line_total().amount(),
                    decrease_to: item.quantity.get().checked_sub(1).filter(|q| *q >= 1),
                    increase_to: item.quantity.get().saturating_add(1),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: pricing.subtotal.amount(),
            shipping: pricing.shipping.amount(),
            tax: pricing.tax.amount(),
            total: pricing.total.amount(),
            free_shipping: pricing.is_free_shipping(),
            free_shipping_gap: pricing.free_shipping_gap().map(|gap| gap.amount()),
            last_error,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self::new(&snapshot.cart, snapshot.last_error.clone())
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart panel fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Toast fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toast.html")]
pub struct ToastTemplate {
    pub notice: Notice,
}

// =============================================================================
// Stock Checks
// =============================================================================

/// Check a request against the product's stock before asking the backend.
///
/// The backend has the final say; this only saves a round trip for
/// requests that are bound to fail.
fn check_stock(product: &Product, requested: Quantity, in_cart: u32) -> Result<(), String> {
    if !product.in_stock() {
        return Err(format!("{} is out of stock", product.name));
    }
    if in_cart.saturating_add(requested.get()) > product.stock {
        return Err(if in_cart > 0 {
            format!(
                "Only {} available ({in_cart} already in your cart)",
                product.stock
            )
        } else {
            format!("Only {} available", product.stock)
        });
    }
    Ok(())
}

fn quantity_message(err: QuantityError) -> &'static str {
    match err {
        QuantityError::Zero => "Quantity must be at least 1",
        QuantityError::NotANumber => "Please enter a whole number",
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Toast for HTMX; notice and redirect otherwise.
async fn notify(
    store: &CartStore,
    headers: &HeaderMap,
    notice: Notice,
    changed: bool,
    fallback: &str,
) -> Response {
    if is_htmx(headers) {
        let toast = ToastTemplate { notice };
        if changed {
            (AppendHeaders([CART_UPDATED]), toast).into_response()
        } else {
            toast.into_response()
        }
    } else {
        push_notice(store.session(), notice).await;
        Redirect::to(fallback).into_response()
    }
}

/// Updated cart panel for HTMX; redirect to the cart page otherwise.
async fn panel(store: &CartStore, headers: &HeaderMap, cart: CartView, changed: bool) -> Response {
    if is_htmx(headers) {
        let panel = CartPanelTemplate { cart };
        if changed {
            (AppendHeaders([CART_UPDATED]), panel).into_response()
        } else {
            panel.into_response()
        }
    } else {
        if let Some(message) = cart.last_error {
            push_notice(store.session(), Notice::error(message)).await;
        }
        Redirect::to("/cart").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// Every visit reloads the cart from the backend; if that fails the last
/// snapshot is shown with the error.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ctx: PageContext,
    store: CartStore,
) -> impl IntoResponse {
    // A failure is logged and kept on the snapshot for the panel to show.
    let _ = store.refresh(state.api(), &customer.access_token).await;
    let snapshot = store.snapshot().await;

    CartShowTemplate {
        ctx,
        cart: CartView::from(&snapshot),
    }
}

/// Cart count badge (HTMX).
pub async fn count(OptionalCustomer(customer): OptionalCustomer, store: CartStore) -> Response {
    let count = match customer {
        Some(_) => store.cart().await.item_count(),
        None => 0,
    };
    CartCountTemplate { count }.into_response()
}

/// Add item to cart (HTMX).
///
/// Answers with a toast; the `cart-updated` event refreshes the badge.
#[instrument(skip(state, customer, store, headers))]
pub async fn add(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    store: CartStore,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id.trim());
    let back_to = format!("/products/{}", urlencoding::encode(product_id.as_str()));

    let quantity = match form.quantity.as_deref().map_or(Ok(Quantity::ONE), Quantity::parse) {
        Ok(quantity) => quantity,
        Err(e) => {
            let notice = Notice::error(quantity_message(e));
            return notify(&store, &headers, notice, false, &back_to).await;
        }
    };

    let product = match state.api().get_product(&product_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::error!("Failed to look up product {product_id} for add to cart: {e}");
            let notice = Notice::error(e.user_message("Failed to add item to cart"));
            return notify(&store, &headers, notice, false, &back_to).await;
        }
    };

    let in_cart = store.cart().await.quantity_of(&product_id);
    if let Err(message) = check_stock(&product, quantity, in_cart) {
        return notify(&store, &headers, Notice::error(message), false, &back_to).await;
    }

    match store
        .add(state.api(), &customer.access_token, &product_id, quantity)
        .await
    {
        Ok(_) => {
            let notice = Notice::success(format!("Added {} to your cart", product.name));
            notify(&store, &headers, notice, true, &back_to).await
        }
        Err(e) => {
            let notice = Notice::error(e.user_message("Failed to add item to cart"));
            notify(&store, &headers, notice, false, &back_to).await
        }
    }
}

/// Update cart line quantity (HTMX).
///
/// Quantities below one are refused here without calling the backend.
#[instrument(skip(state, customer, store, headers))]
pub async fn update(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    store: CartStore,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let quantity = match Quantity::parse(&form.quantity) {
        Ok(quantity) => quantity,
        Err(e) => {
            let cart = CartView::new(&store.cart().await, Some(quantity_message(e).to_string()));
            return panel(&store, &headers, cart, false).await;
        }
    };

    let product_id = ProductId::new(form.product_id.trim());
    let changed = store
        .update(state.api(), &customer.access_token, &product_id, quantity)
        .await
        .is_ok();

    let cart = CartView::from(&store.snapshot().await);
    panel(&store, &headers, cart, changed).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, customer, store, headers))]
pub async fn remove(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    store: CartStore,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id.trim());
    let changed = store
        .remove(state.api(), &customer.access_token, &product_id)
        .await
        .is_ok();

    let cart = CartView::from(&store.snapshot().await);
    panel(&store, &headers, cart, changed).await
}

/// Empty the cart (HTMX).
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    store: CartStore,
    headers: HeaderMap,
) -> Response {
    let changed = store
        .clear(state.api(), &customer.access_token)
        .await
        .is_ok();

    let cart = CartView::from(&store.snapshot().await);
    panel(&store, &headers, cart, changed).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewater_core::{CartItem, Price};

    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Canvas Tote".to_string(),
            description: String::new(),
            price: Price::from_cents(3000),
            category: None,
            image: String::new(),
            stock,
            rating: 0.0,
            review_count: 0,
            features: Vec::new(),
            created_at: None,
        }
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_out_of_stock_is_refused() {
        assert_eq!(
            check_stock(&product(0), qty(1), 0),
            Err("Canvas Tote is out of stock".to_string())
        );
    }

    #[test]
    fn test_request_beyond_stock_counts_cart() {
        assert!(check_stock(&product(5), qty(5), 0).is_ok());
        assert_eq!(
            check_stock(&product(5), qty(6), 0),
            Err("Only 5 available".to_string())
        );
        assert_eq!(
            check_stock(&product(5), qty(2), 4),
            Err("Only 5 available (4 already in your cart)".to_string())
        );
    }

    #[test]
    fn test_cart_view_pricing() {
        let cart = Cart::from_lines([CartItem {
            product_id: ProductId::new("p1"),
            name: "Canvas Tote".to_string(),
            price: Price::from_cents(3000),
            quantity: qty(2),
            image: String::new(),
        }]);
        let view = CartView::new(&cart, None);

        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, Decimal::new(60, 0));
        assert_eq!(view.shipping, Decimal::ZERO);
        assert_eq!(view.tax, Decimal::new(600, 2));
        assert_eq!(view.total, Decimal::new(6600, 2));
        assert!(view.free_shipping);
        assert_eq!(view.items[0].decrease_to, Some(1));
        assert_eq!(view.items[0].increase_to, 3);
    }

    #[test]
    fn test_single_unit_line_cannot_decrease() {
        let cart = Cart::from_lines([CartItem {
            product_id: ProductId::new("p1"),
            name: "Canvas Tote".to_string(),
            price: Price::from_cents(1000),
            quantity: Quantity::ONE,
            image: String::new(),
        }]);
        let view = CartView::new(&cart, None);
        assert_eq!(view.items[0].decrease_to, None);
        assert!(!view.free_shipping);
        assert_eq!(view.free_shipping_gap, Some(Decimal::new(4001, 2)));
    }
}
