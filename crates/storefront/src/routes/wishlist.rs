//! Wishlist route handlers.

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

use coza_core::{ProductId, Wishlist, WishlistItem};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, is_htmx, safe_return_path};
use crate::services::CartStore;
use crate::state::AppState;

/// Wishlist form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: String,
    /// Page to go back to after a plain form post.
    pub return_to: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub page: PageContext,
    pub wishlist: Wishlist,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: String,
    pub in_wishlist: bool,
}

fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn wishlist_changed(headers: &HeaderMap, form: &WishlistForm, in_wishlist: bool) -> Response {
    if is_htmx(headers) {
        return (
            AppendHeaders([("HX-Trigger", "wishlist-updated")]),
            WishlistButtonTemplate {
                product_id: form.product_id.clone(),
                in_wishlist,
            },
        )
            .into_response();
    }

    Redirect::to(safe_return_path(form.return_to.as_deref(), "/wishlist")).into_response()
}

/// Display the wishlist.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> Result<impl IntoResponse> {
    let wishlist = CartStore::new(&session).wishlist().await?;
    Ok(WishlistShowTemplate { page, wishlist })
}

async fn item_for(state: &AppState, id: &ProductId) -> Result<WishlistItem> {
    let product = state
        .catalog()
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(WishlistItem::from(&product))
}

/// Save a product. Saving it twice keeps one entry.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let item = item_for(&state, &id).await?;
    CartStore::new(&session)
        .update_wishlist(|w| w.add(item))
        .await?;

    Ok(wishlist_changed(&headers, &form, true))
}

/// Remove a saved product. Unknown ids are ignored.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    CartStore::new(&session)
        .update_wishlist(|w| w.remove(&id))
        .await?;

    Ok(wishlist_changed(&headers, &form, false))
}

/// Add the product if absent, remove it if present (the heart button).
#[instrument(skip(state, session, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let store = CartStore::new(&session);

    let present = if store.wishlist().await?.has(&id) {
        store.update_wishlist(|w| w.remove(&id)).await?;
        false
    } else {
        let item = item_for(&state, &id).await?;
        store.update_wishlist(|w| w.add(item)).await?;
        true
    };

    Ok(wishlist_changed(&headers, &form, present))
}
