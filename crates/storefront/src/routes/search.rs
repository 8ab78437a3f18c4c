//! Search route handlers.
//!
//! The navbar search dialog requests `/search` with `HX-Request` and swaps in
//! the results fragment; without HTMX the full page is rendered.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use coza_core::catalog::search_products;

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, is_htmx};
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// Most results shown in the dialog fragment.
const SUGGESTION_LIMIT: usize = 6;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search results fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub results: Vec<ProductCard>,
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchPageTemplate {
    pub page: PageContext,
    pub query: String,
    pub results: Vec<ProductCard>,
}

/// Search products by name, category or description.
#[instrument(skip(state, page, headers))]
pub async fn search(
    State(state): State<AppState>,
    page: PageContext,
    headers: HeaderMap,
    Query(params): Query<SearchQuery>,
) -> Result<Response> {
    let query = params.q.trim().to_owned();
    let all = state.catalog().all_products().await?;
    let matches = search_products(&all, &query);

    if is_htmx(&headers) {
        let shown: Vec<_> = matches.into_iter().take(SUGGESTION_LIMIT).collect();
        return Ok(SearchResultsTemplate {
            results: ProductCard::list(&shown, &page),
            query,
        }
        .into_response());
    }

    Ok(SearchPageTemplate {
        results: ProductCard::list(&matches, &page),
        query,
        page,
    }
    .into_response())
}
