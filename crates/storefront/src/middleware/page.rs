//! Layout data shared by every full page.
//!
//! The header shows the signed-in user and the cart/wishlist badges, so each
//! page handler pulls a [`PageContext`] alongside its own data.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use tower_sessions::Session;

use coza_core::{ProductId, Wishlist};

use crate::models::{CurrentUser, keys};
use crate::services::CartStore;

/// Header and navigation data for the base layout.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u64,
    pub wishlist: Wishlist,
    /// Request path, used to highlight the active nav link.
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_admin())
    }

    #[must_use]
    pub fn wishlist_count(&self) -> usize {
        self.wishlist.len()
    }

    /// Whether the heart icon for `id` should be filled.
    #[must_use]
    pub fn in_wishlist(&self, id: &ProductId) -> bool {
        self.wishlist.has(id)
    }

    /// Whether the nav link for `prefix` should be marked active.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI; the original keeps the full path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.path())
            .to_owned();
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                path,
                ..Self::default()
            });
        };

        let user = session
            .get::<CurrentUser>(keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        // Badges are cosmetic; a broken store shows zero rather than failing the page.
        let store = CartStore::new(session);
        let cart_count = store.cart().await.map(|c| c.total_items()).unwrap_or(0);
        let wishlist = store.wishlist().await.unwrap_or_default();

        Ok(Self {
            user,
            cart_count,
            wishlist,
            path,
        })
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &axum::http::HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;

    use super::*;
    use coza_core::{CartItem, Email, UserId, UserRole};

    use crate::test_support::product;

    #[tokio::test]
    async fn test_extracts_badges_and_user() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = CartStore::new(&session);
        store
            .update_cart(|c| c.add_item(CartItem::from(&product("a", "10", "Men")), 3))
            .await
            .unwrap();
        session
            .insert(
                keys::CURRENT_USER,
                CurrentUser {
                    id: UserId::new(1),
                    email: Email::parse("admin@example.com").unwrap(),
                    display_name: "Admin".to_string(),
                    role: UserRole::Admin,
                },
            )
            .await
            .unwrap();

        let (mut parts, ()) = Request::builder()
            .uri("/shop?category=Men")
            .extension(session)
            .body(())
            .unwrap()
            .into_parts();

        let page = PageContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(page.cart_count, 3);
        assert_eq!(page.wishlist_count(), 0);
        assert!(page.is_signed_in());
        assert!(page.is_admin());
        assert!(page.is_active("/shop"));
        assert!(!page.is_active("/"));
    }

    #[tokio::test]
    async fn test_without_session_layer() {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let page = PageContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!page.is_signed_in());
        assert_eq!(page.cart_count, 0);
        assert!(page.is_active("/"));
    }
}
