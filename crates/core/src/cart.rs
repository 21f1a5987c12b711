//! Shopping cart lines and totals.
//!
//! The backend owns the cart; this is the storefront's snapshot of it. A
//! snapshot is only ever replaced wholesale by the cart the backend returned,
//! so there are no in-place mutation methods here.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::OrderPricing;
use crate::types::{Price, ProductId};

/// Errors from constructing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Quantities start at one; removing a line is a separate operation.
    #[error("quantity must be at least 1")]
    Zero,
    /// The value could not be parsed as a whole number.
    #[error("quantity must be a whole number")]
    NotANumber,
}

/// A line quantity, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for zero.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            Err(QuantityError::Zero)
        } else {
            Ok(Self(value))
        }
    }

    /// Parse a quantity from form input, which may be negative or junk.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for values below one and
    /// [`QuantityError::NotANumber`] for anything that is not an integer.
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| QuantityError::NotANumber)?;
        if value < 1 {
            return Err(QuantityError::Zero);
        }
        u32::try_from(value)
            .map_err(|_| QuantityError::NotANumber)
            .and_then(Self::new)
    }

    /// The underlying count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Sum two quantities, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price.
    pub price: Price,
    pub quantity: Quantity,
    pub image: String,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity.get())
    }
}

/// The cart snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Build a cart from backend lines.
    ///
    /// Lines for the same product are merged into the first one, summing
    /// quantities. The backend normally reconciles duplicates itself; this
    /// keeps the snapshot well-formed when it does not.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartItem>) -> Self {
        let mut items: Vec<CartItem> = Vec::new();
        for line in lines {
            match items.iter_mut().find(|i| i.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => items.push(line),
            }
        }
        Self { items }
    }

    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in display order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price x quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity.get()))
    }

    /// Units of one product already in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
            .map_or(0, |item| item.quantity.get())
    }

    /// Shipping, tax and total for this cart.
    #[must_use]
    pub fn pricing(&self) -> OrderPricing {
        OrderPricing::from_subtotal(self.total())
    }
}
