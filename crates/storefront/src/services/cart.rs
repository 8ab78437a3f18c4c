//! Session persistence for the cart and wishlist.
//!
//! Both containers are stored whole under their own session key and written
//! back after every mutation. A payload that no longer deserializes is logged
//! and replaced with an empty container.

use serde::de::DeserializeOwned;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use coza_core::{Cart, Wishlist};

use crate::models::keys;

/// Reads and writes the per-browser containers.
#[derive(Clone, Copy)]
pub struct CartStore<'a> {
    session: &'a Session,
}

impl<'a> CartStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn cart(&self) -> Result<Cart, SessionError> {
        self.load(keys::CART).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        self.session.insert(keys::CART, cart).await
    }

    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn wishlist(&self) -> Result<Wishlist, SessionError> {
        self.load(keys::WISHLIST).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save_wishlist(&self, wishlist: &Wishlist) -> Result<(), SessionError> {
        self.session.insert(keys::WISHLIST, wishlist).await
    }

    /// Load the cart, apply `f`, and save it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn update_cart<R>(
        &self,
        f: impl FnOnce(&mut Cart) -> R,
    ) -> Result<(Cart, R), SessionError> {
        let mut cart = self.cart().await?;
        let result = f(&mut cart);
        self.save_cart(&cart).await?;
        Ok((cart, result))
    }

    /// Load the wishlist, apply `f`, and save it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn update_wishlist<R>(
        &self,
        f: impl FnOnce(&mut Wishlist) -> R,
    ) -> Result<(Wishlist, R), SessionError> {
        let mut wishlist = self.wishlist().await?;
        let result = f(&mut wishlist);
        self.save_wishlist(&wishlist).await?;
        Ok((wishlist, result))
    }

    async fn load<T>(&self, key: &str) -> Result<T, SessionError>
    where
        T: Default + DeserializeOwned,
    {
        match self.session.get::<T>(key).await {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(SessionError::SerdeJson(e)) => {
                tracing::warn!(key, error = %e, "discarding unreadable session payload");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use coza_core::{CartItem, WishlistItem};

    use crate::test_support::product;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_empty_session_yields_empty_containers() {
        let session = session();
        let store = CartStore::new(&session);
        assert!(store.cart().await.unwrap().is_empty());
        assert!(store.wishlist().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_round_trips_through_session() {
        let session = session();
        let store = CartStore::new(&session);
        let p = product("a", "10", "Men");

        store
            .update_cart(|cart| cart.add_item(CartItem::from(&p), 2))
            .await
            .unwrap();
        store
            .update_cart(|cart| cart.add_item(CartItem::from(&p), 1))
            .await
            .unwrap();

        let cart = store.cart().await.unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_payload_becomes_empty() {
        let session = session();
        session.insert(keys::CART, "not a cart").await.unwrap();
        session.insert(keys::WISHLIST, 42).await.unwrap();

        let store = CartStore::new(&session);
        assert!(store.cart().await.unwrap().is_empty());
        assert!(store.wishlist().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wishlist_toggle_persists() {
        let session = session();
        let store = CartStore::new(&session);
        let p = product("a", "10", "Men");

        let (_, present) = store
            .update_wishlist(|w| w.toggle(WishlistItem::from(&p)))
            .await
            .unwrap();
        assert!(present);
        assert!(store.wishlist().await.unwrap().has(&p.id));

        let (_, present) = store
            .update_wishlist(|w| w.toggle(WishlistItem::from(&p)))
            .await
            .unwrap();
        assert!(!present);
        assert!(store.wishlist().await.unwrap().is_empty());
    }
}
