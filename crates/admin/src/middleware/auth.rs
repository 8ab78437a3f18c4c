//! Authentication extractor for admin.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires a signed-in admin.
///
/// Only trusts an admin that [`admin_context_middleware`] confirmed against
/// the `users` table for this request. Anyone else is sent to the login page.
///
/// [`admin_context_middleware`]: super::admin_context_middleware
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Rejection for pages that need a signed-in admin.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or(RedirectToLogin)
    }
}

/// Store the signed-in admin, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin session entirely.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower_sessions::MemoryStore;

    use super::*;
    use coza_core::{Email, UserId};

    #[test]
    fn test_rejection_redirects_to_login() {
        let response = RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/auth/login");
    }

    #[tokio::test]
    async fn test_set_and_clear_current_admin() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let admin = CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("ops@coza.test").unwrap(),
            name: "Ops".to_string(),
        };

        set_current_admin(&session, &admin).await.unwrap();
        let stored: Option<CurrentAdmin> = session.get(session_keys::CURRENT_ADMIN).await.unwrap();
        assert_eq!(stored, Some(admin));

        clear_current_admin(&session).await.unwrap();
        let stored: Option<CurrentAdmin> = session.get(session_keys::CURRENT_ADMIN).await.unwrap();
        assert!(stored.is_none());
    }
}
