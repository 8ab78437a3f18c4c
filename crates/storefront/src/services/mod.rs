//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration/login and credential-checked account changes
//! - `cart` - Session persistence for the cart and wishlist
//! - `catalog` - Cached product reads
//! - `oauth` - Identity provider sign-in

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod oauth;

pub use auth::{AuthError, AuthService};
pub use cart::CartStore;
pub use catalog::CatalogService;
pub use oauth::{OAuthClient, OAuthError};
