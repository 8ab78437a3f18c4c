//! Business logic services for admin.
//!
//! - `auth` - Password sign-in restricted to the admin role

pub mod auth;

pub use auth::{AuthError, AuthService, hash_password};
