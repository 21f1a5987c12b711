//! Order pricing.
//!
//! Every page that shows a shipping, tax or total figure (cart, checkout
//! sidebar, order request, order detail) derives it here so the numbers
//! cannot drift apart.
//!
//! # Rules
//!
//! - Shipping is free when the subtotal is strictly greater than $50.00,
//!   otherwise a flat $5.99.
//! - Tax is 10% of the subtotal, rounded to cents (half away from zero).
//! - Total is subtotal + shipping + tax.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Subtotal above which shipping is free (exclusive).
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Flat shipping charge below the threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(599, 0, 0, false, 2);

/// Tax rate applied to the subtotal.
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Price breakdown for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPricing {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl OrderPricing {
    /// Derive shipping, tax and total from a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Price) -> Self {
        let amount = subtotal.amount();

        let shipping = if amount > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };

        let tax =
            (amount * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            subtotal,
            shipping: Price::new(shipping),
            tax: Price::new(tax),
            total: Price::new(amount + shipping + tax),
        }
    }

    /// Whether the shipping charge was waived.
    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// How much more the shopper needs to spend to get free shipping.
    ///
    /// `None` once shipping is already free.
    #[must_use]
    pub fn free_shipping_gap(&self) -> Option<Price> {
        if self.is_free_shipping() {
            return None;
        }
        // "Strictly greater than" means one more cent past the threshold.
        let needed = FREE_SHIPPING_THRESHOLD + Decimal::new(1, 2) - self.subtotal.amount();
        Some(Price::new(needed.max(Decimal::ZERO)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Price {
        Price::from_cents(c)
    }

    #[test]
    fn test_constants() {
        assert_eq!(FREE_SHIPPING_THRESHOLD, Decimal::new(50, 0));
        assert_eq!(FLAT_SHIPPING, Decimal::new(599, 2));
        assert_eq!(TAX_RATE, Decimal::new(10, 2));
    }

    #[test]
    fn test_subtotal_over_fifty_ships_free() {
        // One item at $30 x 2
        let pricing = OrderPricing::from_subtotal(cents(3000).times(2));
        assert_eq!(pricing.subtotal, cents(6000));
        assert_eq!(pricing.shipping, Price::ZERO);
        assert_eq!(pricing.tax, cents(600));
        assert_eq!(pricing.total, cents(6600));
        assert!(pricing.is_free_shipping());
        assert_eq!(pricing.free_shipping_gap(), None);
    }

    #[test]
    fn test_small_subtotal_pays_flat_shipping() {
        let pricing = OrderPricing::from_subtotal(cents(1000));
        assert_eq!(pricing.shipping, cents(599));
        assert_eq!(pricing.tax, cents(100));
        assert_eq!(pricing.total, cents(1699));
        assert_eq!(pricing.free_shipping_gap(), Some(cents(4001)));
    }

    #[test]
    fn test_exactly_fifty_is_not_free() {
        let pricing = OrderPricing::from_subtotal(cents(5000));
        assert_eq!(pricing.shipping, cents(599));
        assert_eq!(pricing.total, cents(5000 + 599 + 500));
    }

    #[test]
    fn test_just_over_fifty_is_free() {
        let pricing = OrderPricing::from_subtotal(cents(5001));
        assert!(pricing.is_free_shipping());
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 10% of 0.05 = 0.005 -> 0.01
        assert_eq!(OrderPricing::from_subtotal(cents(5)).tax, cents(1));
        // 10% of 19.99 = 1.999 -> 2.00
        assert_eq!(OrderPricing::from_subtotal(cents(1999)).tax, cents(200));
        // 10% of 0.04 = 0.004 -> 0.00
        assert_eq!(OrderPricing::from_subtotal(cents(4)).tax, Price::ZERO);
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        for subtotal in [0, 1, 4999, 5000, 5001, 12345, 99_999] {
            let pricing = OrderPricing::from_subtotal(cents(subtotal));
            assert_eq!(
                pricing.total,
                pricing.subtotal + pricing.shipping + pricing.tax
            );
        }
    }

    #[test]
    fn test_empty_cart_still_charges_shipping() {
        let pricing = OrderPricing::from_subtotal(Price::ZERO);
        assert_eq!(pricing.shipping, cents(599));
        assert_eq!(pricing.total, cents(599));
    }
}
