//! Authentication route handlers for admin.
//!
//! Email and password sign-in; only accounts with the admin role get a
//! session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::services::AuthService;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub email: String,
}

/// Render the login page.
///
/// GET /auth/login
pub async fn login_page(session: Session) -> Response {
    let signed_in = session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .is_some();
    if signed_in {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Check credentials and start an admin session.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.login(&form.email, &form.password).await {
        Ok(user) => {
            let admin = CurrentAdmin::from(&user);
            set_current_admin(&session, &admin).await?;
            set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
            tracing::info!(admin_id = %admin.id, "Admin signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_internal() => Err(AppError::Auth(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in rejected");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    error: Some(e.user_message()),
                    email: form.email.trim().to_string(),
                },
            )
                .into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
