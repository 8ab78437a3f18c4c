//! Cart route handlers.
//!
//! Every mutation loads the cart from the session, applies the change and
//! writes it back. HTMX requests get a fragment plus a `cart-updated`
//! trigger so the header badge refreshes; plain form posts are redirected
//! back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use coza_core::checkout::OrderSummary;
use coza_core::{Cart, CartItem, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, is_htmx};
use crate::services::CartStore;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub qty: Option<u32>,
}

/// Update cart form data. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub qty: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: Cart,
    pub summary: Option<OrderSummary>,
}

/// Cart lines and totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
    pub summary: Option<OrderSummary>,
}

impl CartItemsTemplate {
    fn new(cart: Cart) -> Self {
        Self {
            summary: OrderSummary::for_cart(&cart),
            cart,
        }
    }
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Response after a change on the cart page itself.
fn cart_changed(headers: &HeaderMap, cart: Cart) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate::new(cart),
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> Result<impl IntoResponse> {
    let cart = CartStore::new(&session).cart().await?;

    Ok(CartShowTemplate {
        summary: OrderSummary::for_cart(&cart),
        cart,
        page,
    })
}

/// Add item to cart.
///
/// The product snapshot (name, price, image) is taken from the catalog, not
/// from the form.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let product = state
        .catalog()
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if !product.in_stock() {
        return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
    }

    let qty = form.qty.unwrap_or(1);
    let (cart, ()) = CartStore::new(&session)
        .update_cart(|cart| cart.add_item(CartItem::from(&product), qty))
        .await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.total_items(),
            },
        )
            .into_response());
    }

    Ok(Redirect::to("/cart").into_response())
}

/// Update cart line quantity.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let (cart, ()) = CartStore::new(&session)
        .update_cart(|cart| cart.set_qty(&id, form.qty))
        .await?;

    Ok(cart_changed(&headers, cart))
}

/// Remove a cart line.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let (cart, ()) = CartStore::new(&session)
        .update_cart(|cart| cart.remove_item(&id))
        .await?;

    Ok(cart_changed(&headers, cart))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let (cart, ()) = CartStore::new(&session).update_cart(Cart::clear).await?;

    Ok(cart_changed(&headers, cart))
}

/// Badge value for a cart read. A failed read shows an empty badge.
fn badge_count(cart: std::result::Result<Cart, tower_sessions::session::Error>) -> u64 {
    cart.map(|cart| cart.total_items()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read cart for badge");
        0
    })
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let count = badge_count(CartStore::new(&session).cart().await);
    CartCountTemplate { count }
}
