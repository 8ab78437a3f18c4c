//! Authentication route handlers.
//!
//! Password login and registration. Form errors are rendered inline on the
//! same page; only server faults become error responses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use coza_core::UserProfile;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, clear_current_user, safe_return_path, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

/// Query parameters for the login and register pages.
#[derive(Debug, Default, Deserialize)]
pub struct AuthPageQuery {
    pub next: Option<String>,
    pub error: Option<String>,
}

/// Message for an `?error=` code set by a redirect.
fn error_message(code: &str) -> &'static str {
    match code {
        "provider_disabled" => "Sign in with a provider is not available.",
        "provider_denied" => "Sign in was cancelled.",
        "invalid_state" | "missing_code" => "Sign in expired. Please try again.",
        "provider_email" => "Your provider account has no verified email address.",
        _ => "Something went wrong. Please try again.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
    pub provider_enabled: bool,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub display_name: String,
    pub next: String,
    pub provider_enabled: bool,
}

/// Store the signed-in identity and tag Sentry with it.
pub(crate) async fn sign_in(session: &Session, user: &UserProfile) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "signed in");
    Ok(())
}

/// Turn an auth failure into an inline message, or an error response when
/// the failure is on our side.
fn inline_error(e: AuthError) -> Result<String> {
    if e.is_internal() {
        return Err(AppError::Auth(e));
    }
    Ok(e.user_message())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<AuthPageQuery>,
) -> Response {
    if page.is_signed_in() {
        return Redirect::to("/account").into_response();
    }

    LoginTemplate {
        page,
        error: query.error.as_deref().map(|code| error_message(code).to_owned()),
        email: String::new(),
        next: safe_return_path(query.next.as_deref(), "/account").to_owned(),
        provider_enabled: state.oauth().is_some(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_return_path(form.next.as_deref(), "/account").to_owned();

    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            sign_in(&session, &user).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            let message = inline_error(e)?;
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    page,
                    error: Some(message),
                    email: form.email,
                    next,
                    provider_enabled: state.oauth().is_some(),
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<AuthPageQuery>,
) -> Response {
    if page.is_signed_in() {
        return Redirect::to("/account").into_response();
    }

    RegisterTemplate {
        page,
        error: query.error.as_deref().map(|code| error_message(code).to_owned()),
        email: String::new(),
        display_name: String::new(),
        next: safe_return_path(query.next.as_deref(), "/account").to_owned(),
        provider_enabled: state.oauth().is_some(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A successful registration signs the new customer in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = safe_return_path(form.next.as_deref(), "/account").to_owned();

    match AuthService::new(state.pool())
        .register(
            &form.email,
            &form.display_name,
            &form.password,
            &form.password_confirm,
        )
        .await
    {
        Ok(user) => {
            sign_in(&session, &user).await?;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            tracing::info!("Registration rejected: {e}");
            let message = inline_error(e)?;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                RegisterTemplate {
                    page,
                    error: Some(message),
                    email: form.email,
                    display_name: form.display_name,
                    next,
                    provider_enabled: state.oauth().is_some(),
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. The cart and wishlist stay with the browser.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{body_string, form_post, get, signed_in_cookie, test_app};

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_message("invalid_state"),
            "Sign in expired. Please try again."
        );
        assert_eq!(
            error_message("anything"),
            "Something went wrong. Please try again."
        );
    }

    #[tokio::test]
    async fn test_login_page_renders_next_and_error() {
        let app = test_app(vec![]).await;
        let response = app
            .oneshot(get("/auth/login?next=%2Fcheckout&error=provider_denied", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("value=\"/checkout\""));
        assert!(body.contains("Sign in was cancelled."));
        assert!(!body.contains("/auth/provider/login"));
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_signed_in() {
        let app = test_app(vec![]).await;
        let cookie = signed_in_cookie(&app).await;
        let response = app.oneshot(get("/auth/login", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/account");
    }

    #[tokio::test]
    async fn test_register_password_mismatch_is_inline() {
        let app = test_app(vec![]).await;
        let response = app
            .oneshot(form_post(
                "/auth/register",
                "email=jane%40example.com&display_name=Jane&password=Secret123!&password_confirm=Secret124!",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("Passwords do not match."));
        assert!(body.contains("value=\"jane@example.com\""));
    }

    #[tokio::test]
    async fn test_register_short_and_weak_passwords() {
        let app = test_app(vec![]).await;
        let response = app
            .clone()
            .oneshot(form_post(
                "/auth/register",
                "email=jane%40example.com&password=abc&password_confirm=abc",
                None,
            ))
            .await
            .unwrap();
        assert!(
            body_string(response)
                .await
                .contains("Password should be at least 6 characters.")
        );

        let response = app
            .oneshot(form_post(
                "/auth/register",
                "email=jane%40example.com&password=abcdefg&password_confirm=abcdefg",
                None,
            ))
            .await
            .unwrap();
        assert!(body_string(response).await.contains("Password is too weak."));
    }

    #[tokio::test]
    async fn test_login_with_malformed_email_is_invalid_credentials() {
        let app = test_app(vec![]).await;
        let response = app
            .oneshot(form_post(
                "/auth/login",
                "email=not-an-email&password=whatever",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Invalid email or password."));
    }

    #[tokio::test]
    async fn test_logout_keeps_cart() {
        let app = test_app(vec![crate::test_support::product("a", "10", "Men")]).await;
        let cookie = signed_in_cookie(&app).await;

        app.clone()
            .oneshot(form_post("/cart/add", "product_id=a", Some(&cookie)))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(form_post("/auth/logout", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let response = app.clone().oneshot(get("/cart/count", Some(&cookie))).await.unwrap();
        assert_eq!(body_string(response).await.trim(), "1");

        let response = app.oneshot(get("/account", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
