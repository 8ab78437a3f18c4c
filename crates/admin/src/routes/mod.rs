//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (in main)
//! GET  /health/ready           - Readiness check (in main)
//!
//! # Dashboard
//! GET  /                       - Counts of products, users, admins, low stock
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Email and password sign-in (admins only)
//! POST /auth/logout            - Logout
//!
//! # Products
//! GET  /products               - Product list (?q= searches name and category)
//! GET  /products/new           - New product form
//! POST /products/new           - Create (or overwrite by id)
//! GET  /products/{id}/edit     - Edit form
//! POST /products/{id}/edit     - Save changes
//! POST /products/{id}/delete   - Delete
//!
//! # Users
//! GET  /users                  - User list (?q=, ?role=, ?page=)
//! GET  /users/{id}/edit        - Edit form
//! POST /users/{id}/edit        - Save name, phone, address and role
//! POST /users/{id}/delete      - Delete
//! ```

pub mod auth;
pub mod dashboard;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the complete admin router (without health checks or static files).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/products", get(products::index))
        .route(
            "/products/new",
            get(products::new_page).post(products::create),
        )
        .route(
            "/products/{id}/edit",
            get(products::edit_page).post(products::update),
        )
        .route("/products/{id}/delete", post(products::delete))
        .route("/users", get(users::index))
        .route("/users/{id}/edit", get(users::edit_page).post(users::update))
        .route("/users/{id}/delete", post(users::delete))
}
