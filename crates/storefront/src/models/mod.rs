//! Domain models for storefront.
//!
//! Catalog, cart and profile types live in `coza_core`; this module holds the
//! session-scoped types that only the storefront needs.

pub mod session;

pub use session::{CurrentUser, keys};
