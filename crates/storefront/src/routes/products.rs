//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use coza_core::catalog::related_products;
use coza_core::{Product, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Number of related products under the detail view.
const RELATED_LIMIT: usize = 4;

/// Product grid card data for templates.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub product: Product,
    pub in_wishlist: bool,
}

impl ProductCard {
    /// Cards for `products`, marking the ones already saved.
    #[must_use]
    pub fn list(products: &[Product], page: &PageContext) -> Vec<Self> {
        products
            .iter()
            .map(|product| Self {
                in_wishlist: page.in_wishlist(&product.id),
                product: product.clone(),
            })
            .collect()
    }

    /// Rounded percentage off the original price, for the sale badge.
    #[must_use]
    pub fn discount(&self) -> Option<u32> {
        self.product.discount_percent()
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductCard,
    pub related: Vec<ProductCard>,
}

/// Display product detail page.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("product {id}"));
    let product_id = ProductId::parse(&id).map_err(|_| not_found())?;

    let product = state
        .catalog()
        .product(&product_id)
        .await?
        .ok_or_else(not_found)?;

    let related = match state.catalog().all_products().await {
        Ok(all) => related_products(&all, &product, RELATED_LIMIT),
        Err(e) => {
            tracing::warn!("Failed to load related products: {e}");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        product: ProductCard {
            in_wishlist: page.in_wishlist(&product.id),
            product,
        },
        related: ProductCard::list(&related, &page),
        page,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{body_string, product, test_app};

    #[tokio::test]
    async fn test_show_renders_product_and_related() {
        let mut shirt = product("shirt", "16.64", "Women");
        shirt.original_price = Some(coza_core::Price::parse("24.99").unwrap());
        shirt.is_sale = true;
        let app = test_app(vec![
            shirt,
            product("dress", "30", "Women"),
            product("watch", "200", "Watches"),
        ])
        .await;

        let response = app
            .oneshot(Request::get("/products/shirt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("Product shirt"));
        assert!(body.contains("-33%"));
        assert!(body.contains("Product dress"));
        assert!(!body.contains("Product watch"));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let app = test_app(vec![product("a", "10", "Men")]).await;
        let response = app
            .oneshot(Request::get("/products/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let app = test_app(vec![]).await;
        let response = app
            .oneshot(Request::get("/products/bad%20id").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
