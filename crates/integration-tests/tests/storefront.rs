//! Integration tests for the storefront.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (`coza-cli migrate`, `coza-cli seed products`)
//! - The storefront running (cargo run -p coza-storefront)

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use coza_integration_tests::{
    SEEDED_PRODUCT, client, location, storefront_base_url, unique_email,
};

async fn cart_count(client: &reqwest::Client) -> u32 {
    client
        .get(format!("{}/cart/count", storefront_base_url()))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
        .trim()
        .parse()
        .unwrap()
}

// ============================================================================
// Health & Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health_endpoints() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_shop_filters_by_category() {
    let resp = client()
        .get(format!("{}/shop?category=Watches", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.unwrap();
    assert!(body.contains("Designer Watch"));
    assert!(!body.contains("Esprit Ruffle Shirt"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_unknown_product_is_not_found() {
    let resp = client()
        .get(format!("{}/products/prod_9999", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_htmx_search_returns_fragment() {
    let resp = client()
        .get(format!("{}/search?q=watch", storefront_base_url()))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.unwrap();
    assert!(!body.contains("<html"));
    assert!(body.contains("Smart Watch Pro"));
}

// ============================================================================
// Cart, Wishlist & Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_cart_lifecycle() {
    let client = client();
    let base_url = storefront_base_url();

    assert_eq!(cart_count(&client).await, 0);

    let resp = client
        .post(format!("{base_url}/cart/add"))
        .form(&[("product_id", SEEDED_PRODUCT), ("qty", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");
    assert_eq!(cart_count(&client).await, 2);

    // Adding again merges into the same line
    client
        .post(format!("{base_url}/cart/add"))
        .form(&[("product_id", SEEDED_PRODUCT)])
        .send()
        .await
        .unwrap();
    assert_eq!(cart_count(&client).await, 3);

    // Zero quantity removes the line
    client
        .post(format!("{base_url}/cart/update"))
        .form(&[("product_id", SEEDED_PRODUCT), ("qty", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(cart_count(&client).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_out_of_stock_product_cannot_be_added() {
    // prod_0007 is seeded with no stock
    let resp = client()
        .post(format!("{}/cart/add", storefront_base_url()))
        .form(&[("product_id", "prod_0007")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_wishlist_toggle_twice_removes_product() {
    let client = client();
    let base_url = storefront_base_url();

    for _ in 0..2 {
        let resp = client
            .post(format!("{base_url}/wishlist/toggle"))
            .header("HX-Request", "true")
            .form(&[("product_id", SEEDED_PRODUCT)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let body = client
        .get(format!("{base_url}/wishlist"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!body.contains("Esprit Ruffle Shirt"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_places_order_and_empties_cart() {
    let client = client();
    let base_url = storefront_base_url();

    // Empty cart bounces back to the cart page
    let resp = client.get(format!("{base_url}/checkout")).send().await.unwrap();
    assert_eq!(location(&resp), "/cart");

    client
        .post(format!("{base_url}/cart/add"))
        .form(&[("product_id", SEEDED_PRODUCT)])
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/checkout"))
        .form(&[
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
            ("address", "1 Analytical Way"),
            ("city", "Albany"),
            ("state", "ny"),
            ("zip", "12207"),
            ("phone", "518 555 0100"),
            ("payment_method", "cod"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/checkout/confirmation");

    let resp = client
        .get(format!("{base_url}/checkout/confirmation"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cart_count(&client).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_checkout_rejects_invalid_form() {
    let client = client();
    let base_url = storefront_base_url();

    client
        .post(format!("{base_url}/cart/add"))
        .form(&[("product_id", SEEDED_PRODUCT)])
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base_url}/checkout"))
        .form(&[("first_name", "Ada"), ("zip", "12"), ("payment_method", "cod")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.unwrap();
    assert!(body.contains("ZIP code must be 5 digits"));
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_register_then_visit_account() {
    let client = client();
    let base_url = storefront_base_url();
    let email = unique_email("shopper");

    // Anonymous visitors are sent to sign in
    let resp = client.get(format!("{base_url}/account")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    assert!(location(&resp).starts_with("/auth/login"));

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .form(&[
            ("email", email.as_str()),
            ("display_name", "Shopper"),
            ("password", "Sunny-Days-42"),
            ("password_confirm", "Sunny-Days-42"),
        ])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());

    let resp = client.get(format!("{base_url}/account")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(&email));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_register_duplicate_email_is_rejected() {
    let base_url = storefront_base_url();
    let email = unique_email("twice");
    let form = [
        ("email", email.as_str()),
        ("display_name", "Twice"),
        ("password", "Sunny-Days-42"),
        ("password_confirm", "Sunny-Days-42"),
    ];

    let resp = client()
        .post(format!("{base_url}/auth/register"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());

    let resp = client()
        .post(format!("{base_url}/auth/register"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
    assert!(resp.text().await.unwrap().contains("This email is already in use."));
}
