//! Per-visitor state kept in the session.
//!
//! # Services
//!
//! - `cart` - [`CartStore`], the cart snapshot and the backend calls that
//!   replace it
//! - `checkout` - [`CheckoutStore`], the checkout state machine per visitor
//! - `notice` - one-shot notices shown on the next page

pub mod cart;
pub mod checkout;
pub mod notice;

pub use cart::CartStore;
pub use checkout::CheckoutStore;
pub use notice::{push_notice, take_notice};

use axum::http::request::Parts;
use tower_sessions::Session;

use crate::error::AppError;

/// Session installed by the session layer.
fn session_from_parts(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
}
