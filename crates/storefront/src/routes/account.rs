//! Account route handlers.
//!
//! These routes require authentication. Each form posts to its own endpoint
//! and redirects back with an `?updated=` flag; failures re-render the page
//! with the message next to the form that caused it.

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
use coza_core::profile::{ProfileForm, initials_of};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{CurrentUser, keys};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Query parameters for the account page.
#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    pub updated: Option<String>,
}

/// Email change form data.
#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: String,
    #[serde(default)]
    pub current_password: String,
}

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Which form a message belongs to.
#[derive(Debug, Default)]
pub struct AccountErrors {
    pub profile: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub email: String,
    pub initials: String,
    pub photo_url: Option<String>,
    pub form: ProfileForm,
    pub has_password: bool,
    pub notice: Option<&'static str>,
    pub errors: AccountErrors,
}

fn notice(flag: &str) -> Option<&'static str> {
    match flag {
        "profile" => Some("Profile updated successfully!"),
        "email" => Some("Email updated."),
        "password" => Some("Password updated."),
        _ => None,
    }
}

/// Keep the header's name and email in step with the stored profile.
async fn refresh_current_user(session: &Session, profile: &UserProfile) -> Result<()> {
    session
        .insert(keys::CURRENT_USER, CurrentUser::from(profile))
        .await?;
    Ok(())
}

/// The stored profile, or `None` (logged) when it cannot be loaded.
async fn load_profile(auth: &AuthService<'_>, user: &CurrentUser) -> Option<UserProfile> {
    auth.get_user(user.id)
        .await
        .map_err(|e| tracing::warn!("could not reload profile: {e}"))
        .ok()
}

/// Re-render the page after a rejected form. The header comes from the
/// stored profile, or from the session when it could not be loaded.
async fn rejected(
    auth: &AuthService<'_>,
    page: PageContext,
    user: &CurrentUser,
    profile: Option<&UserProfile>,
    form: ProfileForm,
    errors: AccountErrors,
) -> Response {
    // Only decides whether the "current password" fields are shown.
    let has_password = auth.has_password(user.id).await.unwrap_or_else(|e| {
        tracing::warn!("could not check password presence: {e}");
        true
    });

    let (email, initials, photo_url) = match profile {
        Some(profile) => (
            profile.email.to_string(),
            profile.initials(),
            profile.photo_url.clone(),
        ),
        None => (
            user.email.to_string(),
            initials_of(&user.display_name),
            None,
        ),
    };

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        AccountTemplate {
            page,
            email,
            initials,
            photo_url,
            form,
            has_password,
            notice: None,
            errors,
        },
    )
        .into_response()
}

/// Turn an auth failure into an inline message, or an error response when
/// the failure is on our side.
fn inline_error(e: AuthError) -> Result<String> {
    if e.is_internal() {
        return Err(AppError::Auth(e));
    }
    Ok(e.user_message())
}

/// Display the account page.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    page: PageContext,
    Query(query): Query<AccountQuery>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool());
    let profile = auth.get_user(current_user.id).await?;
    let has_password = auth.has_password(current_user.id).await?;

    Ok(AccountTemplate {
        page,
        email: profile.email.to_string(),
        initials: profile.initials(),
        photo_url: profile.photo_url.clone(),
        form: ProfileForm::from_profile(&profile),
        has_password,
        notice: query.updated.as_deref().and_then(notice),
        errors: AccountErrors::default(),
    })
}

/// Save the profile form.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    session: Session,
    page: PageContext,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());
    match auth.update_profile(current_user.id, &form).await {
        Ok(profile) => {
            refresh_current_user(&session, &profile).await?;
            Ok(Redirect::to("/account?updated=profile").into_response())
        }
        Err(e) => {
            let errors = AccountErrors {
                profile: Some(inline_error(e)?),
                ..AccountErrors::default()
            };
            let profile = load_profile(&auth, &current_user).await;
            Ok(rejected(&auth, page, &current_user, profile.as_ref(), form, errors).await)
        }
    }
}

/// Change the sign-in email.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_email(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    session: Session,
    page: PageContext,
    Form(form): Form<EmailForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());
    match auth
        .change_email(current_user.id, &form.email, &form.current_password)
        .await
    {
        Ok(profile) => {
            refresh_current_user(&session, &profile).await?;
            Ok(Redirect::to("/account?updated=email").into_response())
        }
        Err(e) => {
            let errors = AccountErrors {
                email: Some(inline_error(e)?),
                ..AccountErrors::default()
            };
            let profile = load_profile(&auth, &current_user).await;
            let form = profile_form_for(profile.as_ref(), &current_user);
            Ok(rejected(&auth, page, &current_user, profile.as_ref(), form, errors).await)
        }
    }
}

/// Change or set the password.
#[instrument(skip_all, fields(user_id = %current_user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    page: PageContext,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());
    match auth
        .change_password(
            current_user.id,
            &form.current_password,
            &form.new_password,
            &form.new_password_confirm,
        )
        .await
    {
        Ok(()) => Ok(Redirect::to("/account?updated=password").into_response()),
        Err(e) => {
            let errors = AccountErrors {
                password: Some(inline_error(e)?),
                ..AccountErrors::default()
            };
            let profile = load_profile(&auth, &current_user).await;
            let form = profile_form_for(profile.as_ref(), &current_user);
            Ok(rejected(&auth, page, &current_user, profile.as_ref(), form, errors).await)
        }
    }
}

/// Stored profile values for re-rendering, or just the session name when the
/// profile could not be loaded.
fn profile_form_for(profile: Option<&UserProfile>, user: &CurrentUser) -> ProfileForm {
    profile.map_or_else(
        || ProfileForm {
            display_name: user.display_name.clone(),
            ..ProfileForm::default()
        },
        ProfileForm::from_profile,
    )
}
