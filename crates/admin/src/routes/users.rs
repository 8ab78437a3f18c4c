//! User management route handlers.
//!
//! The list filters by search term and role in memory and shows ten users a
//! page. An admin can edit or delete anyone except that they cannot delete
//! their own account or drop their own admin role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use coza_core::profile::ProfileForm;
use coza_core::{UserId, UserProfile, UserRole};

use crate::{
    components::{DataTableConfig, PAGE_SIZE, Page, data_table::users_table_config},
    db::{RepositoryError, UserRepository, UserUpdate},
    error::{AppError, Result},
    filters,
    middleware::RequireAdmin,
    models::{CurrentAdmin, session_keys},
    state::AppState,
};

use super::dashboard::AdminUserView;

const SELF_DELETE: &str = "You cannot delete your own account.";
const SELF_DEMOTE: &str = "You cannot remove your own admin role.";

/// Query parameters for the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
    pub notice: Option<String>,
}

/// User row for the list table.
#[derive(Debug, Clone)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: &'static str,
    pub is_admin: bool,
    pub joined: String,
    pub is_self: bool,
}

impl UserView {
    fn new(user: &UserProfile, admin: &CurrentAdmin) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name_or_email().to_string(),
            email: user.email.to_string(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.as_str(),
            is_admin: user.is_admin(),
            joined: user.created_at.format("%b %-d, %Y").to_string(),
            is_self: user.id == admin.id,
        }
    }
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableConfig,
    pub users: Vec<UserView>,
    pub search: String,
    pub role: String,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_users: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub notice: Option<&'static str>,
}

/// Editable user fields, as posted by the edit page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserEditForm {
    pub display_name: String,
    pub phone: String,
    pub address: String,
    pub role: String,
}

impl UserEditForm {
    fn from_user(user: &UserProfile) -> Self {
        Self {
            display_name: user.display_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            address: user.address.clone().unwrap_or_default(),
            role: user.role.as_str().to_string(),
        }
    }

    /// Name, phone and address follow the account page's profile rules.
    fn validate(&self) -> std::result::Result<UserUpdate, String> {
        let profile = ProfileForm {
            display_name: self.display_name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            bio: String::new(),
        }
        .validate()
        .map_err(|e| e.to_string())?;

        let role = self.role.parse::<UserRole>()?;

        Ok(UserUpdate {
            display_name: profile.display_name,
            phone: profile.phone,
            address: profile.address,
            role,
        })
    }
}

/// User edit template.
#[derive(Template, WebTemplate)]
#[template(path = "users/edit.html")]
pub struct UserEditTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub user_id: i32,
    pub email: String,
    pub is_self: bool,
    pub form: UserEditForm,
    pub roles: &'static [UserRole],
    pub error: Option<String>,
}

impl UserEditTemplate {
    fn new(admin: &CurrentAdmin, user_id: UserId, email: String, form: UserEditForm) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/users".to_string(),
            user_id: user_id.as_i32(),
            email,
            is_self: user_id == admin.id,
            form,
            roles: &UserRole::ALL,
            error: None,
        }
    }
}

fn notice(flag: &str) -> Option<&'static str> {
    match flag {
        "updated" => Some("User updated."),
        "deleted" => Some("User deleted."),
        _ => None,
    }
}

/// Users matching the search term and, when given, the role.
fn filter_users(users: Vec<UserProfile>, search: &str, role: Option<UserRole>) -> Vec<UserProfile> {
    users
        .into_iter()
        .filter(|u| role.is_none_or(|r| u.role == r))
        .filter(|u| u.matches_search(search))
        .collect()
}

/// Link to another page of the list with the same filters.
fn page_href(search: &str, role: &str, page: usize) -> String {
    let mut href = format!("/users?page={page}");
    if !search.is_empty() {
        href.push_str(&format!("&q={}", urlencoding::encode(search)));
    }
    if !role.is_empty() {
        href.push_str(&format!("&role={}", urlencoding::encode(role)));
    }
    href
}

async fn load_user(state: &AppState, id: UserId) -> Result<UserProfile> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// User list page.
///
/// GET /users
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<UsersIndexTemplate> {
    let search = query.q.unwrap_or_default().trim().to_string();
    // Unknown roles fall back to "all roles".
    let role = query
        .role
        .as_deref()
        .and_then(|r| r.parse::<UserRole>().ok());
    let role_key = role.map(|r| r.as_str().to_string()).unwrap_or_default();

    let users = UserRepository::new(state.pool()).list_all().await?;
    let page = Page::paginate(
        filter_users(users, &search, role),
        query.page.unwrap_or(1),
        PAGE_SIZE,
    );

    Ok(UsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/users".to_string(),
        table: users_table_config(),
        users: page.items.iter().map(|u| UserView::new(u, &admin)).collect(),
        previous_href: page
            .has_previous()
            .then(|| page_href(&search, &role_key, page.number - 1)),
        next_href: page
            .has_next()
            .then(|| page_href(&search, &role_key, page.number + 1)),
        page_number: page.number,
        total_pages: page.total_pages,
        total_users: page.total_items,
        search,
        role: role_key,
        notice: query.notice.as_deref().and_then(notice),
    })
}

/// Edit form for a user.
///
/// GET /users/{id}/edit
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = id))]
pub async fn edit_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<UserEditTemplate> {
    let user = load_user(&state, UserId::new(id)).await?;

    Ok(UserEditTemplate::new(
        &admin,
        user.id,
        user.email.to_string(),
        UserEditForm::from_user(&user),
    ))
}

/// Save changes to a user.
///
/// POST /users/{id}/edit
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<UserEditForm>,
) -> Result<Response> {
    let id = UserId::new(id);

    let (status, error) = match form.validate() {
        Ok(update) if id == admin.id && update.role != UserRole::Admin => {
            (StatusCode::FORBIDDEN, SELF_DEMOTE.to_string())
        }
        Ok(update) => {
            let user = match UserRepository::new(state.pool()).update(id, &update).await {
                Ok(user) => user,
                Err(RepositoryError::NotFound) => {
                    return Err(AppError::NotFound(format!("user {id}")));
                }
                Err(e) => return Err(e.into()),
            };
            tracing::info!(user_id = %id, admin_id = %admin.id, role = %user.role, "User updated");

            if user.id == admin.id {
                session
                    .insert(session_keys::CURRENT_ADMIN, CurrentAdmin::from(&user))
                    .await?;
            }
            return Ok(Redirect::to("/users?notice=updated").into_response());
        }
        Err(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    // The email is display-only; a failed lookup just leaves it blank.
    let email = match UserRepository::new(state.pool()).get_by_id(id).await {
        Ok(Some(user)) => user.email.to_string(),
        Ok(None) => return Err(AppError::NotFound(format!("user {id}"))),
        Err(e) => {
            tracing::warn!("could not reload user for the edit form: {e}");
            String::new()
        }
    };

    let mut template = UserEditTemplate::new(&admin, id, email, form);
    template.error = Some(error);
    Ok((status, template).into_response())
}

/// Delete a user.
///
/// POST /users/{id}/delete
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = UserId::new(id);
    if id == admin.id {
        return Err(AppError::Forbidden(SELF_DELETE.to_string()));
    }

    match UserRepository::new(state.pool()).delete(id).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => return Err(AppError::NotFound(format!("user {id}"))),
        Err(e) => return Err(e.into()),
    }
    tracing::info!(user_id = %id, admin_id = %admin.id, "User deleted");

    Ok(Redirect::to("/users?notice=deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{DateTime, Utc};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{
        TEST_ADMIN_ID, app, body_string, form_post, get, lazy_state, signed_in_cookie,
    };
    use coza_core::Email;

    fn user(id: i32, name: &str, role: UserRole) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            email: Email::parse(&format!("user{id}@coza.test")).unwrap(),
            display_name: name.to_string(),
            role,
            address: None,
            phone: Some(format!("555-01{id:02}")),
            bio: None,
            photo_url: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_filter_users_by_search_and_role() {
        let users = vec![
            user(1, "Ada Admin", UserRole::Admin),
            user(2, "Bob Buyer", UserRole::Customer),
            user(3, "Ada Shopper", UserRole::Customer),
        ];

        let ada = filter_users(users.clone(), "ada", None);
        assert_eq!(ada.len(), 2);

        let ada_customers = filter_users(users.clone(), "ada", Some(UserRole::Customer));
        assert_eq!(ada_customers.len(), 1);
        assert_eq!(ada_customers.first().unwrap().id, UserId::new(3));

        let by_phone = filter_users(users.clone(), "555-0102", None);
        assert_eq!(by_phone.len(), 1);

        assert_eq!(filter_users(users, "", None).len(), 3);
    }

    #[test]
    fn test_twenty_five_users_make_three_pages() {
        let users: Vec<UserProfile> = (1..=25)
            .map(|i| user(i, "Customer", UserRole::Customer))
            .collect();
        let page = Page::paginate(filter_users(users, "", None), 3, PAGE_SIZE);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn test_page_href_keeps_filters() {
        assert_eq!(page_href("", "", 2), "/users?page=2");
        assert_eq!(
            page_href("ada lovelace", "admin", 3),
            "/users?page=3&q=ada%20lovelace&role=admin"
        );
    }

    #[test]
    fn test_edit_form_validation() {
        let form = UserEditForm {
            display_name: " Ada ".to_string(),
            phone: String::new(),
            address: "1 Loop Rd".to_string(),
            role: "admin".to_string(),
        };
        let update = form.validate().unwrap();
        assert_eq!(update.display_name, "Ada");
        assert_eq!(update.phone, None);
        assert_eq!(update.role, UserRole::Admin);

        let blank = UserEditForm {
            role: "customer".to_string(),
            ..UserEditForm::default()
        };
        assert_eq!(blank.validate().unwrap_err(), "Name is required.");

        let bad_role = UserEditForm {
            display_name: "Ada".to_string(),
            role: "owner".to_string(),
            ..UserEditForm::default()
        };
        assert!(bad_role.validate().is_err());
    }

    #[tokio::test]
    async fn test_users_requires_admin() {
        let response = app(lazy_state()).oneshot(get("/users", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let app = app(lazy_state());
        let cookie = signed_in_cookie(&app).await;

        let response = app
            .oneshot(form_post(
                &format!("/users/{TEST_ADMIN_ID}/delete"),
                "",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains(SELF_DELETE));
    }

    #[tokio::test]
    async fn test_cannot_demote_self() {
        let app = app(lazy_state());
        let cookie = signed_in_cookie(&app).await;

        let response = app
            .oneshot(form_post(
                &format!("/users/{TEST_ADMIN_ID}/edit"),
                "display_name=Ops&role=customer",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains(SELF_DEMOTE));
    }
}
