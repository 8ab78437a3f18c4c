//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user in route handlers.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, keys};

/// Extractor that requires a signed-in user.
///
/// If nobody is logged in, returns a redirect to the login page that brings
/// the user back afterwards.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests), with the page to return to.
    RedirectToLogin(String),
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&format!(
                "/auth/login?next={}",
                urlencoding::encode(&next)
            ))
            .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if parts.headers.contains_key("hx-request") {
                    return AuthRejection::Unauthorized;
                }
                let path = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or_else(|| parts.uri.path(), |uri| uri.path());
                AuthRejection::RedirectToLogin(path.to_owned())
            })?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// The cart and wishlist stay in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    Ok(())
}

/// Only same-site absolute paths are accepted as redirect targets; anything
/// else yields `fallback`.
#[must_use]
pub fn safe_return_path<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => fallback,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use coza_core::{Email, UserId, UserRole};

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("jane@example.com").unwrap(),
            display_name: "Jane".to_string(),
            role: UserRole::Customer,
        }
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/checkout"), "/account"), "/checkout");
        assert_eq!(safe_return_path(Some("//evil.test"), "/account"), "/account");
        assert_eq!(safe_return_path(Some("https://evil.test"), "/account"), "/account");
        assert_eq!(safe_return_path(Some("/\\evil.test"), "/account"), "/account");
        assert_eq!(safe_return_path(None, "/wishlist"), "/wishlist");
    }

    #[test]
    fn test_redirect_carries_next() {
        let response = AuthRejection::RedirectToLogin("/account".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/auth/login?next=%2Faccount"
        );
    }

    #[tokio::test]
    async fn test_set_and_clear_current_user() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        set_current_user(&session, &user()).await.unwrap();
        let stored: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.unwrap();
        assert_eq!(stored, Some(user()));

        session.insert(keys::WISHLIST, vec!["kept"]).await.unwrap();
        clear_current_user(&session).await.unwrap();
        let stored: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.unwrap();
        assert!(stored.is_none());
        let wishlist: Option<Vec<String>> = session.get(keys::WISHLIST).await.unwrap();
        assert!(wishlist.is_some());
    }
}
