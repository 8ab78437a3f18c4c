//! Integration tests for the Coza store.
//!
//! These tests drive the running servers over HTTP, so they are `#[ignore]`d
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Database, migrations and seed data
//! cargo run -p coza-cli -- migrate
//! cargo run -p coza-cli -- seed products
//!
//! # Both servers
//! cargo run -p coza-storefront &
//! cargo run -p coza-admin &
//!
//! # Admin tests sign in with an existing admin account
//! export ADMIN_TEST_EMAIL=ops@example.com ADMIN_TEST_PASSWORD=...
//!
//! cargo test -p coza-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - defaults to `http://localhost:3000`
//! - `ADMIN_BASE_URL` - defaults to `http://localhost:3001`
//! - `ADMIN_TEST_EMAIL`, `ADMIN_TEST_PASSWORD` - admin credentials

#![allow(clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};

/// Product id from the bundled seed catalog that is in stock.
pub const SEEDED_PRODUCT: &str = "prod_0001";

/// Base URL for the storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client with its own cookie jar that does not follow redirects, so tests
/// can assert on them.
///
/// The auth rate limiter keys on proxy headers, so every request claims to
/// come from localhost.
#[must_use]
pub fn client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static("127.0.0.1"));

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique email address for accounts created by a test.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@coza.test", uuid::Uuid::new_v4().simple())
}

/// Location header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Sign in to the admin panel with `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD`.
pub async fn admin_client() -> Client {
    let email = std::env::var("ADMIN_TEST_EMAIL").expect("ADMIN_TEST_EMAIL not set");
    let password = std::env::var("ADMIN_TEST_PASSWORD").expect("ADMIN_TEST_PASSWORD not set");

    let client = client();
    let response = client
        .post(format!("{}/auth/login", admin_base_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to sign in");

    assert_eq!(response.status(), StatusCode::SEE_OTHER, "admin sign-in failed");
    client
}
