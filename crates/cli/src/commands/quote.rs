//! Price a subtotal with the checkout rules.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use tidewater_core::{OrderPricing, Price};

/// Errors that can occur while quoting.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Not a non-negative amount.
    #[error("Invalid subtotal: {0}")]
    InvalidSubtotal(String),
}

fn parse_subtotal(raw: &str) -> Result<Price, QuoteError> {
    let trimmed = raw.trim().trim_start_matches('$');
    Decimal::from_str(trimmed)
        .ok()
        .filter(|amount| !amount.is_sign_negative())
        .map(Price::new)
        .ok_or_else(|| QuoteError::InvalidSubtotal(raw.to_owned()))
}

/// Log shipping, tax and total for `subtotal`.
pub fn run(subtotal: &str) -> Result<(), QuoteError> {
    let pricing = OrderPricing::from_subtotal(parse_subtotal(subtotal)?);

    tracing::info!("Subtotal: {}", pricing.subtotal);
    if pricing.is_free_shipping() {
        tracing::info!("Shipping: free");
    } else {
        tracing::info!("Shipping: {}", pricing.shipping);
    }
    tracing::info!("Tax:      {}", pricing.tax);
    tracing::info!("Total:    {}", pricing.total);
    if let Some(gap) = pricing.free_shipping_gap() {
        tracing::info!("Spend {gap} more for free shipping");
    }
    Ok(())
}
