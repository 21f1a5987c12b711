//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use tidewater_core::CatalogQuery;

use crate::filters;
use crate::models::Notice;
use crate::routes::PageContext;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Products shown in the featured grid.
const FEATURED_COUNT: usize = 8;

/// A category shortcut on the home page.
#[derive(Clone)]
pub struct CategoryLink {
    pub label: String,
    pub url: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<ProductCardView>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page.
///
/// Shares the first catalog page (and its cache entry) with `/products`.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let (featured, categories, ctx) = match state.api().list_products(&CatalogQuery::default()).await
    {
        Ok(page) => {
            let featured = page
                .products
                .iter()
                .take(FEATURED_COUNT)
                .map(ProductCardView::from)
                .collect();
            let categories = page
                .categories()
                .into_iter()
                .map(|category| CategoryLink {
                    url: format!(
                        "/products?category={}",
                        urlencoding::encode(category.key())
                    ),
                    label: category.label().to_string(),
                })
                .collect();
            (featured, categories, ctx)
        }
        Err(e) => {
            tracing::error!("Failed to fetch featured products: {e}");
            let notice = Notice::error(e.user_message("Failed to load products"));
            (Vec::new(), Vec::new(), ctx.with_notice(notice))
        }
    };

    HomeTemplate {
        ctx,
        featured,
        categories,
    }
}
