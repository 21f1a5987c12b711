//! Catalog browsing: what to fetch, how to filter it, how to page it.
//!
//! Browsing state splits in two:
//!
//! - [`CatalogQuery`] is sent to the backend. Its fields are exactly the set
//!   that invalidates a fetched page: change any of them and the page must be
//!   fetched again. It is also the cache key for fetched pages.
//! - [`ClientFilter`] narrows the page already fetched (search text, price
//!   range, category). Changing it never triggers a fetch. Filtering does not
//!   reach across pages.

use core::fmt;
use core::str::FromStr;

use crate::product::Product;
use crate::types::{Category, Price};

/// Label of the catch-all category choice.
pub const ALL_CATEGORIES: &str = "All Categories";

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort options offered on the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOption {
    #[default]
    Featured,
    Newest,
    PriceLow,
    PriceHigh,
    Rating,
}

impl SortOption {
    /// Every option, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Featured,
        Self::Newest,
        Self::PriceLow,
        Self::PriceHigh,
        Self::Rating,
    ];

    /// Query-string value used by the storefront's own URLs.
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Newest => "Newest",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Rating => "Top Rated",
        }
    }

    /// Backend sort field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Featured | Self::Newest => "createdAt",
            Self::PriceLow | Self::PriceHigh => "price",
            Self::Rating => "rating",
        }
    }

    /// Backend sort direction.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        match self {
            Self::PriceLow => SortDirection::Asc,
            Self::Featured | Self::Newest | Self::PriceHigh | Self::Rating => SortDirection::Desc,
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_param() == s.trim())
            .ok_or_else(|| format!("invalid sort option: {s}"))
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

// =============================================================================
// Page size
// =============================================================================

/// Products per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    #[default]
    Twelve,
    TwentyFour,
    FortyEight,
    NinetySix,
}

impl PageSize {
    /// Every choice, in menu order.
    pub const ALL: [Self; 4] = [
        Self::Twelve,
        Self::TwentyFour,
        Self::FortyEight,
        Self::NinetySix,
    ];

    /// Number of products.
    #[must_use]
    pub const fn get(&self) -> u32 {
        match self {
            Self::Twelve => 12,
            Self::TwentyFour => 24,
            Self::FortyEight => 48,
            Self::NinetySix => 96,
        }
    }

    /// Map a requested size onto a supported one.
    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.get() == value)
    }
}

// =============================================================================
// Server-side query
// =============================================================================

/// Parse a category choice from a form or query string.
///
/// Blank input and the "All Categories" entry both mean no category filter.
pub struct CategorySelection;

impl CategorySelection {
    /// Returns the trimmed category as given, or `None` for "all".
    ///
    /// Case is kept: the backend receives the slug or name the shopper
    /// picked. Comparisons go through [`Category::normalize`].
    #[must_use]
    pub fn parse(input: &str) -> Option<String> {
        let normalized = Category::normalize(input);
        if normalized.is_empty()
            || normalized == Category::normalize(ALL_CATEGORIES)
            || normalized == "all"
        {
            None
        } else {
            Some(input.trim().to_owned())
        }
    }
}

/// Parameters of a catalog fetch.
///
/// Two queries are equal when they would hit the same cache entry, so the
/// category compares by its normalized key.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    page: u32,
    page_size: PageSize,
    category: Option<String>,
    sort: SortOption,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::default(),
            category: None,
            sort: SortOption::default(),
        }
    }
}

impl PartialEq for CatalogQuery {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for CatalogQuery {}

impl core::hash::Hash for CatalogQuery {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.cache_key().hash(state);
    }
}

impl CatalogQuery {
    /// Create a query for page 1 with the given settings.
    #[must_use]
    pub fn new(page_size: PageSize, category: Option<String>, sort: SortOption) -> Self {
        Self {
            page: 1,
            page_size,
            category: category.as_deref().and_then(CategorySelection::parse),
            sort,
        }
    }

    /// Move to a page; pages start at 1.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Change the category filter and go back to page 1.
    #[must_use]
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category.and_then(CategorySelection::parse);
        self.page = 1;
        self
    }

    /// Change the sort and go back to page 1.
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self.page = 1;
        self
    }

    /// Change the page size and go back to page 1.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self.page = 1;
        self
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub const fn sort(&self) -> SortOption {
        self.sort
    }

    /// Query-string pairs for the backend `GET /products` call.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.page_size.get().to_string()),
            ("sort", self.sort.field().to_string()),
            ("order", self.sort.direction().as_str().to_string()),
        ];
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        params
    }

    /// Stable string form, used as a cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "products:{}:{}:{}:{}",
            self.page,
            self.page_size.get(),
            self.category.as_deref().map(Category::normalize).unwrap_or_default(),
            self.sort.as_param()
        )
    }
}

// =============================================================================
// Client-side filter
// =============================================================================

/// Filters applied to an already-fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    search: String,
    min_price: Option<Price>,
    max_price: Option<Price>,
    category: Option<String>,
}

impl ClientFilter {
    /// Create a filter. Blank search text means no search.
    #[must_use]
    pub fn new(
        search: &str,
        min_price: Option<Price>,
        max_price: Option<Price>,
        category: Option<&str>,
    ) -> Self {
        Self {
            search: search.trim().to_lowercase(),
            min_price,
            max_price,
            category: category.and_then(CategorySelection::parse),
        }
    }

    /// Whether the filter lets every product through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.category.is_none()
    }

    /// Whether a single product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product) && self.matches_price(product) && self.matches_category(product)
    }

    /// Products from the page that pass, in page order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    fn matches_search(&self, product: &Product) -> bool {
        if self.search.is_empty() {
            return true;
        }
        [
            product.name.as_str(),
            product.description.as_str(),
            product.category_label(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&self.search))
    }

    fn matches_price(&self, product: &Product) -> bool {
        self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }

    fn matches_category(&self, product: &Product) -> bool {
        match &self.category {
            None => true,
            Some(wanted) => product
                .category
                .as_ref()
                .is_some_and(|category| category.matches(wanted)),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Number of page links shown around the current page.
pub const PAGE_WINDOW: u32 = 5;

/// Pagination derived from the server-reported total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
    total: u64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, page_size: PageSize, total: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.get(),
            total,
        }
    }

    /// Current page (1-based).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Total number of products across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// `ceil(total / page_size)`; zero when there are no products.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// 1-based number of the first product on this page, or 0 if the page is empty.
    #[must_use]
    pub fn first_item(&self) -> u64 {
        let first = u64::from(self.page - 1) * u64::from(self.page_size) + 1;
        if first > self.total { 0 } else { first }
    }

    /// 1-based number of the last product on this page, or 0 if the page is empty.
    #[must_use]
    pub fn last_item(&self) -> u64 {
        if self.first_item() == 0 {
            return 0;
        }
        (u64::from(self.page) * u64::from(self.page_size)).min(self.total)
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Page numbers to link, at most [`PAGE_WINDOW`], centred on the current page where possible.
    #[must_use]
    pub fn window(&self) -> Vec<u32> {
        let total_pages = self.total_pages();
        if total_pages == 0 {
            return Vec::new();
        }
        let current = self.page.min(total_pages);
        let half = PAGE_WINDOW / 2;
        let mut start = current.saturating_sub(half).max(1);
        let end = (start + PAGE_WINDOW - 1).min(total_pages);
        start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
        (start..=end).collect()
    }
}
