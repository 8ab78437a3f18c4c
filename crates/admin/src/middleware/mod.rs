//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, `SameSite=Strict`)
//! 4. Admin context (re-check the signed-in admin against `users`, record it
//!    on the span and Sentry scope)
//! 5. Security headers (stricter CSP than the storefront)
//! 6. `RequireAdmin` extractor on every page except login

pub mod admin_context;
pub mod auth;
pub mod security_headers;
pub mod session;

pub use admin_context::admin_context_middleware;
pub use auth::{RequireAdmin, clear_current_admin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
