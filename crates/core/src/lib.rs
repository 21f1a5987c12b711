//! Tidewater Core - storefront domain rules.
//!
//! This crate holds the pieces of the storefront that do not talk to the
//! network:
//! - [`types`] - Newtype IDs, emails, prices, categories and statuses
//! - [`pricing`] - Shipping, tax and total derivation for a subtotal
//! - [`cart`] - Cart lines and quantities
//! - [`catalog`] - Catalog queries, client-side filters and pagination
//! - [`checkout`] - The four-step checkout state machine
//! - [`order`] - Orders as returned by the backend and order requests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session access. The storefront and the CLI both build on it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod pricing;
pub mod product;
pub mod types;

pub use cart::{Cart, CartItem, Quantity, QuantityError};
pub use catalog::{
    CatalogQuery, CategorySelection, ClientFilter, PageSize, Pagination, SortDirection,
    SortOption,
};
pub use checkout::{Checkout, CheckoutError, CheckoutStep, ShippingError, ShippingInfo};
pub use order::{Order, OrderCustomer, OrderFilter, OrderItem, OrderRequest, OrderRequestItem};
pub use pricing::OrderPricing;
pub use product::{Product, ProductPage};
pub use types::*;
