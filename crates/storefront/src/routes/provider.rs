//! Identity provider sign-in.
//!
//! Authorization-code flow against the configured OAuth provider. The CSRF
//! `state` value and the page to return to are kept in the session between
//! the redirect out and the callback.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use coza_core::Email;

use crate::db::UserRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::safe_return_path;
use crate::models::keys;
use crate::routes::auth::sign_in;
use crate::services::oauth::generate_state;
use crate::services::OAuthError;
use crate::state::AppState;

/// Query parameters for starting the flow.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderLoginQuery {
    pub next: Option<String>,
}

/// Query parameters the provider sends back.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn login_error(code: &str) -> Response {
    Redirect::to(&format!("/auth/login?error={code}")).into_response()
}

/// Redirect to the provider's authorization page.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProviderLoginQuery>,
) -> Result<Response> {
    let Some(client) = state.oauth() else {
        return Ok(login_error("provider_disabled"));
    };

    let csrf = generate_state();
    session.insert(keys::OAUTH_STATE, &csrf).await?;
    session
        .insert(
            keys::RETURN_TO,
            safe_return_path(query.next.as_deref(), "/account"),
        )
        .await?;

    let url = client.authorization_url(&state.config().oauth_redirect_uri(), &csrf);
    Ok(Redirect::to(&url).into_response())
}

/// Handle the provider's redirect back.
///
/// The stored state is consumed whether or not it matches, so a callback
/// URL cannot be replayed.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let Some(client) = state.oauth() else {
        return Ok(login_error("provider_disabled"));
    };

    let expected: Option<String> = session.remove(keys::OAUTH_STATE).await?;
    let return_to: Option<String> = session.remove(keys::RETURN_TO).await?;

    if let Some(error) = query.error {
        tracing::info!(error = %error, "provider sign-in declined");
        return Ok(login_error("provider_denied"));
    }

    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => {
            tracing::warn!("provider callback with mismatched state");
            return Ok(login_error("invalid_state"));
        }
    }

    let Some(code) = query.code else {
        return Ok(login_error("missing_code"));
    };

    let redirect_uri = state.config().oauth_redirect_uri();
    let token = client.exchange_code(&code, &redirect_uri).await?;
    let info = client.user_info(&token).await?;

    let email = match info.verified_email().map(Email::parse) {
        Ok(Ok(email)) => email,
        Ok(Err(e)) => {
            tracing::warn!("provider returned an unusable email: {e}");
            return Ok(login_error("provider_email"));
        }
        Err(e @ (OAuthError::MissingEmail | OAuthError::UnverifiedEmail)) => {
            tracing::warn!("{e}");
            return Ok(login_error("provider_email"));
        }
        Err(e) => return Err(AppError::OAuth(e)),
    };

    let name = info.name.as_deref().unwrap_or_default();
    let user = UserRepository::new(state.pool())
        .upsert_from_provider(&email, name, info.picture.as_deref())
        .await?;

    let user_id = user.id.to_string();
    add_breadcrumb("auth", "provider sign-in", Some(&[("user_id", user_id.as_str())]));
    sign_in(&session, &user).await?;

    let target = safe_return_path(return_to.as_deref(), "/account").to_owned();
    Ok(Redirect::to(&target).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use crate::test_support::{app, get, lazy_state, oauth_state, session_cookie};

    #[tokio::test]
    async fn test_login_disabled_without_config() {
        let response = app(lazy_state())
            .oneshot(get("/auth/provider/login", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?error=provider_disabled"
        );
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider() {
        let response = app(oauth_state())
            .oneshot(get("/auth/provider/login?next=%2Fcheckout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("https://idp.test/authorize?"));
        assert!(location.contains("state="));
        assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fprovider%2Fcallback"));
    }

    #[tokio::test]
    async fn test_callback_rejects_wrong_state() {
        let app = app(oauth_state());
        let response = app
            .clone()
            .oneshot(get("/auth/provider/login", None))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(get(
                "/auth/provider/callback?code=abc&state=forged",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?error=invalid_state"
        );
    }

    #[tokio::test]
    async fn test_callback_without_flow_is_invalid_state() {
        let response = app(oauth_state())
            .oneshot(get("/auth/provider/callback?code=abc&state=x", None))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?error=invalid_state"
        );
    }

    #[tokio::test]
    async fn test_callback_with_provider_error() {
        let response = app(oauth_state())
            .oneshot(get("/auth/provider/callback?error=access_denied", None))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?error=provider_denied"
        );
    }
}
