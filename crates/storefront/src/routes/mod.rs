//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Backend reachability
//!
//! # Products
//! GET  /products               - Product listing (page, limit, category, sort, q, min_price, max_price)
//! GET  /products/results       - Listing results fragment (HTMX)
//! GET  /products/{id}          - Product detail
//!
//! # Cart (requires login, HTMX fragments)
//! GET  /cart                   - Cart page
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/add               - Add to cart (returns toast, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart panel)
//! POST /cart/remove            - Remove line (returns cart panel)
//! POST /cart/clear             - Empty the cart (returns cart panel)
//!
//! # Checkout (requires login)
//! GET  /checkout               - Current step
//! POST /checkout/shipping      - Shipping -> Payment
//! POST /checkout/payment       - Payment -> Review
//! POST /checkout/back          - One step back
//! POST /checkout/place-order   - Review -> Complete
//!
//! # Orders (requires login)
//! GET  /orders                 - Order history (?status=)
//! GET  /orders/{id}            - Order detail
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod context;
pub mod health;
pub mod home;
pub mod orders;
pub mod products;

pub use context::PageContext;

use axum::{
    Router,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/results", get(products::results))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/place-order", post(checkout::place_order))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("that page".to_string())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .fallback(not_found)
}
