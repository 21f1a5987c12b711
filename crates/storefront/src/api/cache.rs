//! Cache types for backend API responses.

use tidewater_core::{CatalogQuery, Product, ProductId, ProductPage};

/// Cache key for products.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(CatalogQuery),
}

impl CacheKey {
    /// String form used as the moka key.
    pub fn as_key(&self) -> String {
        match self {
            Self::Product(id) => format!("product:{id}"),
            Self::Products(query) => query.cache_key(),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
}
