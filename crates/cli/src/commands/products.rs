//! Catalog inspection commands.
//!
//! # Environment Variables
//!
//! - `TIDEWATER_API_URL` - Base URL of the backend API

use thiserror::Error;
use tidewater_core::{
    CatalogQuery, CategorySelection, PageSize, Pagination, ProductId, SortOption,
};
use tidewater_storefront::api::{ApiClient, ApiError};
use tidewater_storefront::config::{ApiConfig, ConfigError};

/// Errors that can occur while reading the catalog.
#[derive(Debug, Error)]
pub enum ProductsError {
    /// Backend settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Unsupported page size.
    #[error("Invalid page size: {0}. Valid sizes: 12, 24, 48, 96")]
    InvalidPageSize(u32),

    /// Unknown sort option.
    #[error("{0}")]
    InvalidSort(String),
}

/// Build the catalog query for the `list` command.
fn build_query(
    page: u32,
    limit: u32,
    category: Option<&str>,
    sort: &str,
) -> Result<CatalogQuery, ProductsError> {
    let page_size = PageSize::from_value(limit).ok_or(ProductsError::InvalidPageSize(limit))?;
    let sort: SortOption = sort.parse().map_err(ProductsError::InvalidSort)?;
    let category = category.and_then(CategorySelection::parse);

    Ok(CatalogQuery::new(page_size, category, sort).with_page(page))
}

/// List one page of the catalog.
pub async fn list(
    page: u32,
    limit: u32,
    category: Option<&str>,
    sort: &str,
) -> Result<(), ProductsError> {
    let query = build_query(page, limit, category, sort)?;
    let client = ApiClient::new(&ApiConfig::from_env()?);

    tracing::info!("Fetching products ({})", query.cache_key());
    let result = client.list_products(&query).await?;
    let pagination = Pagination::new(query.page(), query.page_size(), result.total);

    for product in &result.products {
        let category = product
            .category
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        tracing::info!(
            "{}  {:<40} {:>10}  stock {:>4}  {}",
            product.id,
            product.name,
            product.price,
            product.stock,
            category
        );
    }

    tracing::info!(
        "Page {} of {} ({} products total)",
        pagination.page(),
        pagination.total_pages(),
        pagination.total()
    );
    Ok(())
}

/// Show a single product.
pub async fn show(id: &str) -> Result<(), ProductsError> {
    let client = ApiClient::new(&ApiConfig::from_env()?);
    let product = client.get_product(&ProductId::new(id)).await?;

    tracing::info!("{} ({})", product.name, product.id);
    tracing::info!("Price: {}", product.price);
    tracing::info!(
        "Rating: {:.1} from {} reviews",
        product.rating,
        product.review_count
    );
    tracing::info!("Stock: {}", product.stock);
    if let Some(category) = &product.category {
        tracing::info!("Category: {category}");
    }
    if let Some(created_at) = product.created_at {
        tracing::info!("Added: {}", created_at.format("%Y-%m-%d"));
    }
    for feature in &product.features {
        tracing::info!("  - {feature}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_defaults() {
        let query = build_query(1, 12, None, "featured").unwrap();
        assert_eq!(query, CatalogQuery::default());
    }

    #[test]
    fn test_build_query_keeps_category() {
        let query = build_query(3, 24, Some("Home Goods"), "price-low").unwrap();
        assert_eq!(query.page(), 3);
        assert_eq!(query.page_size(), PageSize::TwentyFour);
        assert_eq!(query.sort(), SortOption::PriceLow);
        assert_eq!(query.category(), Some("Home Goods"));

        let all = build_query(1, 12, Some("All Categories"), "featured").unwrap();
        assert_eq!(all.category(), None);
    }

    #[test]
    fn test_build_query_rejects_bad_input() {
        assert!(matches!(
            build_query(1, 10, None, "featured"),
            Err(ProductsError::InvalidPageSize(10))
        ));
        assert!(matches!(
            build_query(1, 12, None, "cheapest"),
            Err(ProductsError::InvalidSort(_))
        ));
    }
}
