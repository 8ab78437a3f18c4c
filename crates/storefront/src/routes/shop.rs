//! Shop listing with filters and sorting.
//!
//! The whole catalog is read (from cache) and narrowed in memory; there is no
//! pagination.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use coza_core::catalog::CATEGORIES;
use coza_core::{CategoryFilter, PriceBucket, ProductQuery, SortOrder};

use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// Shop query parameters.
///
/// `sort` wins over `filter`; `filter` is the shorthand used by the home page
/// and navigation links (`new`, `sale`, `best`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShopParams {
    pub q: String,
    pub category: String,
    pub price: String,
    pub sort: String,
    pub filter: String,
}

impl ShopParams {
    /// Interpret the parameters. Unrecognised values fall back to defaults.
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        let sort = if self.sort.trim().is_empty() {
            SortOrder::from_filter_param(&self.filter)
        } else {
            self.sort.parse().unwrap_or_default()
        };

        ProductQuery {
            query: self.q.trim().to_owned(),
            category: CategoryFilter::parse(&self.category),
            bucket: self.price.parse().unwrap_or_default(),
            sort,
        }
    }

    /// `/shop` with the same parameters, for links that repeat this listing.
    #[must_use]
    pub fn href(&self) -> String {
        let pairs: Vec<String> = [
            ("q", &self.q),
            ("category", &self.category),
            ("price", &self.price),
            ("sort", &self.sort),
            ("filter", &self.filter),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value.trim())))
        .collect();

        if pairs.is_empty() {
            "/shop".to_string()
        } else {
            format!("/shop?{}", pairs.join("&"))
        }
    }
}

/// An `<option>` or radio choice in the filter sidebar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn category_options(selected: &CategoryFilter) -> Vec<FilterOption> {
    CATEGORIES
        .iter()
        .map(|&category| FilterOption {
            value: category.to_owned(),
            label: category.to_owned(),
            selected: selected.label().eq_ignore_ascii_case(category),
        })
        .collect()
}

fn bucket_options(selected: PriceBucket) -> Vec<FilterOption> {
    PriceBucket::ALL
        .iter()
        .map(|bucket| FilterOption {
            value: bucket.index().to_string(),
            label: bucket.label().to_owned(),
            selected: *bucket == selected,
        })
        .collect()
}

fn sort_options(selected: SortOrder) -> Vec<FilterOption> {
    SortOrder::ALL
        .iter()
        .map(|order| FilterOption {
            value: order.key().to_owned(),
            label: order.label().to_owned(),
            selected: *order == selected,
        })
        .collect()
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub page: PageContext,
    pub query: String,
    pub categories: Vec<FilterOption>,
    pub buckets: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub products: Vec<ProductCard>,
    pub total: usize,
    pub error: Option<String>,
    /// Reloads the listing with the current filters.
    pub retry_href: String,
}

/// Display the shop listing.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(params): Query<ShopParams>,
) -> impl IntoResponse {
    let query = params.to_query();

    let (products, error) = match state.catalog().all_products().await {
        Ok(all) => (query.apply(&all), None),
        Err(e) => {
            tracing::error!("Failed to load products: {e}");
            (
                Vec::new(),
                Some("Products are unavailable right now.".to_string()),
            )
        }
    };

    ShopTemplate {
        categories: category_options(&query.category),
        buckets: bucket_options(query.bucket),
        sorts: sort_options(query.sort),
        total: products.len(),
        products: ProductCard::list(&products, &page),
        query: query.query,
        error,
        retry_href: params.href(),
        page,
    }
}
