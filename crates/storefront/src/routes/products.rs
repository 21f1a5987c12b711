//! Product route handlers.
//!
//! The listing fetches one page from the backend per [`CatalogQuery`] and
//! narrows it with a [`ClientFilter`]. Search and price changes only swap
//! the `#catalog-results` fragment and are served from the cached page.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tidewater_core::{
    CatalogQuery, ClientFilter, PageSize, Pagination, Price, Product, ProductId, ProductPage,
    SortOption, catalog::ALL_CATEGORIES,
};

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::PageContext;
use crate::services::CartStore;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Product card data for listings.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub category: String,
    pub price: Decimal,
    pub stars: String,
    pub review_count: u32,
    pub in_stock: bool,
    pub low_stock: bool,
    pub stock: u32,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.image.clone(),
            category: product.category_label().to_string(),
            price: product.price.amount(),
            stars: star_row(product.full_stars()),
            review_count: product.review_count,
            in_stock: product.in_stock(),
            low_stock: product.is_low_stock(),
            stock: product.stock,
        }
    }
}

/// Five stars, the first `full` of them filled.
fn star_row(full: u8) -> String {
    (0..5u8)
        .map(|i| if i < full { '\u{2605}' } else { '\u{2606}' })
        .collect()
}

/// An `<option>` in a select.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A numbered pagination link.
#[derive(Clone)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
    pub results_url: String,
    pub current: bool,
}

/// Pagination controls.
#[derive(Clone)]
pub struct PaginationView {
    pub summary: String,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
    pub links: Vec<PageLink>,
}

/// Everything the listing renders.
#[derive(Clone)]
pub struct CatalogView {
    pub products: Vec<ProductCardView>,
    /// Products on the fetched page before client filters.
    pub fetched: usize,
    pub filtered: bool,
    pub pagination: PaginationView,
    pub categories: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub page_sizes: Vec<SelectOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub price_hint: Option<String>,
    pub error: Option<String>,
}

/// Full product detail.
#[derive(Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub rating: String,
    pub features: Vec<String>,
    /// Largest quantity the selector allows; zero when out of stock.
    pub max_quantity: u32,
    pub in_cart: u32,
}

impl ProductDetailView {
    fn new(product: &Product, in_cart: u32) -> Self {
        Self {
            card: ProductCardView::from(product),
            description: product.description.clone(),
            rating: format!("{:.1}", product.rating),
            features: product.features.clone(),
            max_quantity: product.clamp_quantity(u32::MAX).unwrap_or(0),
            in_cart,
        }
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Listing query parameters.
///
/// Everything is taken as text and parsed leniently: a bad value falls back
/// to its default instead of failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_price(value: Option<&String>) -> Option<Price> {
    non_blank(value)
        .and_then(|v| Decimal::from_str(v.trim_start_matches('$')).ok())
        .filter(|amount| !amount.is_sign_negative())
        .map(Price::new)
}

impl CatalogParams {
    /// The server-side part of the request.
    #[must_use]
    pub fn catalog_query(&self) -> CatalogQuery {
        let page_size = non_blank(self.limit.as_ref())
            .and_then(|v| v.parse().ok())
            .and_then(PageSize::from_value)
            .unwrap_or_default();
        let sort = non_blank(self.sort.as_ref())
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let page = non_blank(self.page.as_ref())
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        CatalogQuery::new(page_size, self.category.clone(), sort).with_page(page)
    }

    /// The client-side part of the request.
    #[must_use]
    pub fn client_filter(&self) -> ClientFilter {
        ClientFilter::new(
            non_blank(self.q.as_ref()).unwrap_or_default(),
            parse_price(self.min_price.as_ref()),
            parse_price(self.max_price.as_ref()),
            self.category.as_deref(),
        )
    }

    /// Listing URL for another page of the same query.
    fn page_url(&self, base: &str, query: &CatalogQuery, page: u32) -> String {
        let mut pairs: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("limit", query.page_size().get().to_string()),
            ("sort", query.sort().as_param().to_string()),
        ];
        if let Some(category) = query.category() {
            pairs.push(("category", category.to_string()));
        }
        for (key, value) in [
            ("q", &self.q),
            ("min_price", &self.min_price),
            ("max_price", &self.max_price),
        ] {
            if let Some(value) = non_blank(value.as_ref()) {
                pairs.push((key, value.to_string()));
            }
        }

        let query_string = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{base}?{query_string}")
    }
}

// =============================================================================
// Catalog Assembly
// =============================================================================

impl CatalogView {
    fn build(
        params: &CatalogParams,
        query: &CatalogQuery,
        page: &ProductPage,
        error: Option<String>,
    ) -> Self {
        let filter = params.client_filter();
        let products = filter
            .apply(&page.products)
            .into_iter()
            .map(ProductCardView::from)
            .collect();

        let mut categories = vec![SelectOption {
            value: String::new(),
            label: ALL_CATEGORIES.to_string(),
            selected: query.category().is_none(),
        }];
        categories.extend(page.categories().into_iter().map(|category| SelectOption {
            selected: query.category().is_some_and(|c| category.matches(c)),
            value: category.key().to_string(),
            label: category.label().to_string(),
        }));

        let sort_options = SortOption::ALL
            .iter()
            .map(|sort| SelectOption {
                value: sort.as_param().to_string(),
                label: sort.label().to_string(),
                selected: *sort == query.sort(),
            })
            .collect();

        let page_sizes = PageSize::ALL
            .iter()
            .map(|size| SelectOption {
                value: size.get().to_string(),
                label: format!("{} per page", size.get()),
                selected: *size == query.page_size(),
            })
            .collect();

        let price_hint = page
            .price_bounds()
            .map(|(low, high)| format!("{low} \u{2013} {high}"));

        Self {
            products,
            fetched: page.products.len(),
            filtered: !filter.is_empty(),
            pagination: pagination_view(params, query, page.total),
            categories,
            sort_options,
            page_sizes,
            search: params.q.clone().unwrap_or_default(),
            min_price: params.min_price.clone().unwrap_or_default(),
            max_price: params.max_price.clone().unwrap_or_default(),
            price_hint,
            error,
        }
    }
}

fn pagination_view(params: &CatalogParams, query: &CatalogQuery, total: u64) -> PaginationView {
    let pagination = Pagination::new(query.page(), query.page_size(), total);
    let link = |number: u32| PageLink {
        number,
        url: params.page_url("/products", query, number),
        results_url: params.page_url("/products/results", query, number),
        current: number == pagination.page(),
    };

    let summary = if pagination.first_item() == 0 {
        "No products".to_string()
    } else {
        format!(
            "Showing {}\u{2013}{} of {}",
            pagination.first_item(),
            pagination.last_item(),
            pagination.total()
        )
    };

    PaginationView {
        summary,
        prev: pagination.has_prev().then(|| link(pagination.page() - 1)),
        next: pagination.has_next().then(|| link(pagination.page() + 1)),
        links: pagination.window().into_iter().map(link).collect(),
    }
}

/// Fetch the page for `params` and render it. A failed fetch shows an
/// empty listing with the error instead of failing the request.
async fn load_catalog(state: &AppState, params: &CatalogParams) -> CatalogView {
    let query = params.catalog_query();
    match state.api().list_products(&query).await {
        Ok(page) => CatalogView::build(params, &query, &page, None),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            CatalogView::build(
                params,
                &query,
                &ProductPage::default(),
                Some(e.user_message("Failed to load products")),
            )
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub catalog: CatalogView,
}

/// Listing results fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/catalog_results.html")]
pub struct CatalogResultsTemplate {
    pub catalog: CatalogView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductDetailView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    let catalog = load_catalog(&state, &params).await;
    ProductsIndexTemplate { ctx, catalog }
}

/// Listing results fragment (HTMX).
#[instrument(skip(state))]
pub async fn results(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> impl IntoResponse {
    CatalogResultsTemplate {
        catalog: load_catalog(&state, &params).await,
    }
}

/// Display a product.
#[instrument(skip(state, ctx, cart))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    cart: CartStore,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state.api().get_product(&id).await.map_err(|e| match e {
        ApiError::NotFound(_) => AppError::NotFound("that product".to_string()),
        other => AppError::Api(other),
    })?;

    let in_cart = cart.cart().await.quantity_of(&id);

    Ok(ProductShowTemplate {
        ctx,
        product: ProductDetailView::new(&product, in_cart),
    })
}
