//! Confirms the signed-in admin on every request and records who it is.
//!
//! Runs inside the session layer. The session only remembers who signed in;
//! the `users` row decides whether they are still an admin. A deleted or
//! demoted admin has their session flushed on the next request. The
//! confirmed admin is placed in the request extensions for
//! [`RequireAdmin`](super::RequireAdmin), and its id lands on the request
//! span and the Sentry scope.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::Span;

use coza_core::UserProfile;

use crate::db::UserRepository;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// The admin a session should act as, given the current `users` row.
///
/// `None` when the user is gone or no longer holds the admin role.
pub(crate) fn confirmed_admin(
    stored: &CurrentAdmin,
    current: Option<&UserProfile>,
) -> Option<CurrentAdmin> {
    current
        .filter(|profile| profile.id == stored.id && profile.is_admin())
        .map(CurrentAdmin::from)
}

/// The admin stored in the session, if any.
pub(crate) async fn stored_admin(session: &Session) -> Option<CurrentAdmin> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Bring the session in line with the current `users` row: refresh the
/// stored name and email, or flush the session when access is gone.
///
/// # Errors
///
/// Returns an error if a revoked session cannot be flushed.
pub(crate) async fn confirm_session_admin(
    session: &Session,
    stored: &CurrentAdmin,
    current: Option<&UserProfile>,
) -> Result<Option<CurrentAdmin>, tower_sessions::session::Error> {
    let Some(admin) = confirmed_admin(stored, current) else {
        tracing::warn!(admin_id = %stored.id, "Admin access revoked, ending session");
        session.flush().await?;
        return Ok(None);
    };

    if admin != *stored
        && let Err(e) = session.insert(session_keys::CURRENT_ADMIN, &admin).await
    {
        tracing::warn!(error = %e, "Could not refresh admin session");
    }
    Ok(Some(admin))
}

/// Record the confirmed admin for handlers, logs and Sentry.
pub(crate) fn attach_admin(request: &mut Request, admin: Option<CurrentAdmin>) {
    match admin {
        Some(admin) => {
            Span::current().record("admin_id", admin.id.as_i32());
            set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
            request.extensions_mut().insert(admin);
        }
        None => clear_sentry_user(),
    }
}

pub async fn admin_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return next.run(request).await;
    };

    let admin = match stored_admin(&session).await {
        None => None,
        Some(stored) => {
            let current = match UserRepository::new(state.pool()).get_by_id(stored.id).await {
                Ok(current) => current,
                Err(e) => return AppError::Database(e).into_response(),
            };
            match confirm_session_admin(&session, &stored, current.as_ref()).await {
                Ok(admin) => admin,
                Err(e) => return AppError::Session(e).into_response(),
            }
        }
    };

    attach_admin(&mut request, admin);
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use coza_core::UserRole;

    use super::*;
    use crate::test_support::{
        app_with_access_check, app_with_current_user, get, lazy_state, signed_in_cookie,
        test_admin, test_admin_profile,
    };

    #[test]
    fn test_admin_still_holding_role_is_confirmed_with_fresh_details() {
        let stored = test_admin();
        let renamed = UserProfile {
            display_name: "Ops Lead".to_string(),
            ..test_admin_profile()
        };
        let admin = confirmed_admin(&stored, Some(&renamed)).unwrap();
        assert_eq!(admin.id, stored.id);
        assert_eq!(admin.name, "Ops Lead");
    }

    #[test]
    fn test_demoted_admin_is_not_confirmed() {
        let demoted = UserProfile {
            role: UserRole::Customer,
            ..test_admin_profile()
        };
        assert!(confirmed_admin(&test_admin(), Some(&demoted)).is_none());
    }

    #[test]
    fn test_deleted_admin_is_not_confirmed() {
        assert!(confirmed_admin(&test_admin(), None).is_none());
    }

    #[tokio::test]
    async fn test_revoked_admin_session_is_flushed() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(session_keys::CURRENT_ADMIN, test_admin())
            .await
            .unwrap();

        let admin = confirm_session_admin(&session, &test_admin(), None)
            .await
            .unwrap();
        assert!(admin.is_none());
        assert!(stored_admin(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_demoted_admin_loses_panel_access() {
        let demoted = UserProfile {
            role: UserRole::Customer,
            ..test_admin_profile()
        };
        let app = app_with_current_user(lazy_state(), Some(demoted));
        let cookie = signed_in_cookie(&app).await;

        for path in ["/", "/users", "/products/new"] {
            let response = app
                .clone()
                .oneshot(get(path, Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(
                response.headers().get("location").unwrap(),
                "/auth/login",
                "{path}"
            );
        }
    }

    #[tokio::test]
    async fn test_deleted_admin_loses_panel_access() {
        let app = app_with_current_user(lazy_state(), None);
        let cookie = signed_in_cookie(&app).await;

        let response = app.oneshot(get("/users", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_unverifiable_admin_is_refused() {
        let app = app_with_access_check(lazy_state());
        let cookie = signed_in_cookie(&app).await;

        let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_anonymous_request_skips_lookup() {
        let response = app_with_access_check(lazy_state())
            .oneshot(get("/auth/login", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
