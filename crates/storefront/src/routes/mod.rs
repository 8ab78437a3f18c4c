//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page (hero, categories, featured products)
//! GET  /health                  - Health check (added in main)
//!
//! # Catalog
//! GET  /shop                    - Filterable, sortable product grid
//! GET  /products/{id}           - Product detail
//! GET  /search                  - Search page, or result fragment (HTMX)
//!
//! # Cart (HTMX fragments or redirects)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add to cart (triggers cart-updated)
//! POST /cart/update             - Set a line quantity
//! POST /cart/remove             - Remove a line
//! POST /cart/clear              - Empty the cart
//! GET  /cart/count              - Cart count badge (fragment)
//!
//! # Wishlist
//! GET  /wishlist                - Wishlist page
//! POST /wishlist/add            - Save a product
//! POST /wishlist/remove         - Forget a product
//! POST /wishlist/toggle         - Toggle, returns the heart button fragment
//!
//! # Checkout
//! GET  /checkout                - Checkout form
//! POST /checkout                - Validate and place the order
//! GET  /checkout/confirmation   - Last placed order
//!
//! # Auth (rate limited)
//! GET  /auth/login              - Login page
//! POST /auth/login              - Login action
//! GET  /auth/register           - Register page
//! POST /auth/register           - Register action
//! POST /auth/logout             - Logout action
//! GET  /auth/provider/login     - Redirect to the identity provider
//! GET  /auth/provider/callback  - Handle the provider callback
//!
//! # Account (requires auth)
//! GET  /account                 - Profile page
//! POST /account                 - Save profile
//! POST /account/email           - Change email
//! POST /account/password        - Change password
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod provider;
pub mod search;
pub mod shop;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/provider/login", get(provider::login))
        .route("/provider/callback", get(provider::callback))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/toggle", post(wishlist::toggle))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/confirmation", get(checkout::confirmation))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index).post(account::update_profile))
        .route("/email", post(account::update_email))
        .route("/password", post(account::update_password))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/shop", get(shop::index))
        .route("/products/{id}", get(products::show))
        .route("/search", get(search::search))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}
