//! Coza Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every Coza component:
//! - `storefront` - Public-facing shop (catalog, cart, wishlist, checkout, account)
//! - `admin` - Administration panel (product and user management)
//! - `cli` - Command-line tools for migrations, seeding and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Persistence of the cart and wishlist containers is
//! the caller's job; they only need to be serializable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and roles
//! - [`cart`] - Shopping cart container
//! - [`wishlist`] - Wishlist container
//! - [`catalog`] - Product model and the filter/sort pipeline
//! - [`checkout`] - Order summary math and checkout form validation
//! - [`product_form`] - Admin product form validation
//! - [`password`] - Password rules and strength scoring
//! - [`profile`] - User profile type and profile form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod password;
pub mod product_form;
pub mod profile;
pub mod types;
pub mod wishlist;

pub use cart::{Cart, CartItem, CartLine};
pub use catalog::{CategoryFilter, PriceBucket, Product, ProductQuery, SortOrder};
pub use profile::UserProfile;
pub use types::*;
pub use wishlist::{Wishlist, WishlistItem};
