//! Products as the storefront sees them.
//!
//! Products are read-only here; the backend owns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Category, Price, ProductId};

/// Stock level below which the "only N left" hint is shown.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Image used when the backend has none for a product.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// A product from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Option<Category>,
    pub image: String,
    pub stock: u32,
    /// Average rating, 0.0 to 5.0.
    pub rating: f64,
    pub review_count: u32,
    pub features: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether any units can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether stock is running out (but not gone).
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock < LOW_STOCK_THRESHOLD
    }

    /// Clamp a requested quantity into `[1, stock]`.
    ///
    /// Returns `None` when the product is out of stock.
    #[must_use]
    pub fn clamp_quantity(&self, requested: u32) -> Option<u32> {
        self.in_stock().then(|| requested.clamp(1, self.stock))
    }

    /// Number of whole stars to draw for the rating.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn full_stars(&self) -> u8 {
        // Clamped to 0..=5 first, so the cast is exact.
        self.rating.clamp(0.0, 5.0).floor() as u8
    }

    /// Category label, or an empty string when uncategorized.
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category.as_ref().map_or("", Category::label)
    }
}

/// One server-paginated page of products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total number of products matching the query across all pages.
    pub total: u64,
}

impl ProductPage {
    /// Distinct categories present on this page, in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        let mut seen: Vec<Category> = Vec::new();
        for category in self.products.iter().filter_map(|p| p.category.as_ref()) {
            if !seen.contains(category) {
                seen.push(category.clone());
            }
        }
        seen
    }

    /// Lowest and highest price on this page.
    #[must_use]
    pub fn price_bounds(&self) -> Option<(Price, Price)> {
        let min = self.products.iter().map(|p| p.price).min()?;
        let max = self.products.iter().map(|p| p.price).max()?;
        Some((min, max))
    }
}
