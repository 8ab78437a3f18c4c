//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::{
    db::{ProductRepository, UserRepository},
    error::Result,
    filters,
    middleware::RequireAdmin,
    models::CurrentAdmin,
    state::AppState,
};

/// Signed-in admin, as shown in the sidebar.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
        }
    }
}

/// Dashboard metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub products: i64,
    pub users: i64,
    pub admins: i64,
    pub low_stock: i64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub metrics: DashboardMetrics,
}

/// Dashboard page handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<DashboardTemplate> {
    let products = ProductRepository::new(state.pool());
    let users = UserRepository::new(state.pool());

    let (product_count, low_stock, user_count, admin_count) = tokio::try_join!(
        products.count(),
        products.count_low_stock(),
        users.count(),
        users.count_admins(),
    )?;

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        metrics: DashboardMetrics {
            products: product_count,
            users: user_count,
            admins: admin_count,
            low_stock,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::test_support::{app, get, lazy_state, signed_in_cookie};

    #[tokio::test]
    async fn test_dashboard_requires_admin() {
        let response = app(lazy_state()).oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/auth/login");
    }

    #[tokio::test]
    async fn test_dashboard_database_down_is_server_error() {
        let app = app(lazy_state());
        let cookie = signed_in_cookie(&app).await;

        let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
