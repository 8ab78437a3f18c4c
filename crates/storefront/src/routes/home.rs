//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use coza_core::catalog::PRODUCT_CATEGORIES;

use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductCard;
use crate::services::catalog::FEATURED_LIMIT;
use crate::state::AppState;

/// A slide in the hero banner.
#[derive(Clone)]
pub struct HeroSlide {
    pub eyebrow: &'static str,
    pub title: &'static str,
    pub button_url: &'static str,
    pub image_path: &'static str,
}

const HERO_SLIDES: [HeroSlide; 3] = [
    HeroSlide {
        eyebrow: "Women Collection 2026",
        title: "New Season",
        button_url: "/shop?category=Women",
        image_path: "/static/images/slide-01.jpg",
    },
    HeroSlide {
        eyebrow: "Men New-Season",
        title: "Jackets & Coats",
        button_url: "/shop?category=Men",
        image_path: "/static/images/slide-02.jpg",
    },
    HeroSlide {
        eyebrow: "Men Collection 2026",
        title: "New Arrivals",
        button_url: "/shop?filter=new",
        image_path: "/static/images/slide-03.jpg",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub slides: Vec<HeroSlide>,
    pub categories: Vec<&'static str>,
    pub featured: Vec<ProductCard>,
    /// Set when the catalog could not be loaded; the page offers a retry link.
    pub error: Option<String>,
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let (featured, error) = match state.catalog().featured_products(FEATURED_LIMIT).await {
        Ok(products) => (ProductCard::list(&products, &page), None),
        Err(e) => {
            tracing::error!("Failed to load featured products: {e}");
            (
                Vec::new(),
                Some("Products are unavailable right now.".to_string()),
            )
        }
    };

    HomeTemplate {
        page,
        slides: HERO_SLIDES.to_vec(),
        categories: PRODUCT_CATEGORIES.to_vec(),
        featured,
        error,
    }
}
