//! Product management route handlers.
//!
//! The list searches by name or category. Create and edit share one form;
//! validation errors re-render it with every problem listed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use coza_core::catalog::PRODUCT_CATEGORIES;
use coza_core::product_form::{ProductDraft, ProductForm};
use coza_core::{Product, ProductId};

use crate::{
    components::{DataTableConfig, data_table::products_table_config},
    db::{ProductRepository, RepositoryError},
    error::{AppError, Result},
    filters,
    middleware::RequireAdmin,
    models::CurrentAdmin,
    state::AppState,
};

use super::dashboard::AdminUserView;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub notice: Option<String>,
}

/// Product row for the list table.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub stock: u32,
    pub is_sale: bool,
    pub is_new: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            original_price: product.original_price.map(|p| p.to_string()),
            stock: product.stock,
            is_sale: product.is_sale,
            is_new: product.is_new,
        }
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableConfig,
    pub products: Vec<ProductView>,
    pub search: String,
    pub notice: Option<&'static str>,
}

/// Shared create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    /// `None` while creating; the product id when editing.
    pub editing: Option<String>,
    pub action: String,
    pub form: ProductForm,
    pub categories: &'static [&'static str],
    pub errors: Vec<String>,
}

impl ProductFormTemplate {
    fn new(admin: &CurrentAdmin, editing: Option<&ProductId>, form: ProductForm) -> Self {
        let action = editing.map_or_else(
            || "/products/new".to_string(),
            |id| format!("/products/{id}/edit"),
        );
        Self {
            admin_user: AdminUserView::from(admin),
            current_path: "/products".to_string(),
            editing: editing.map(ToString::to_string),
            action,
            form,
            categories: &PRODUCT_CATEGORIES,
            errors: vec![],
        }
    }

    fn rejected(mut self, errors: Vec<String>) -> Response {
        self.errors = errors;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

fn notice(flag: &str) -> Option<&'static str> {
    match flag {
        "created" => Some("Product added."),
        "updated" => Some("Product updated."),
        "deleted" => Some("Product deleted."),
        _ => None,
    }
}

/// Validate the posted form, keeping the messages for the re-render.
fn validate(form: &ProductForm) -> std::result::Result<ProductDraft, Vec<String>> {
    form.validate()
        .map_err(|errors| errors.iter().map(ToString::to_string).collect())
}

/// Unknown or malformed ids are both "not found".
fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|_| AppError::NotFound(format!("product {raw}")))
}

/// Product list page.
///
/// GET /products
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let search = query.q.unwrap_or_default().trim().to_string();
    let products = ProductRepository::new(state.pool()).search(&search).await?;

    Ok(ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        table: products_table_config(),
        products: products.iter().map(ProductView::from).collect(),
        search,
        notice: query.notice.as_deref().and_then(notice),
    })
}

/// Empty product form.
///
/// GET /products/new
pub async fn new_page(RequireAdmin(admin): RequireAdmin) -> ProductFormTemplate {
    ProductFormTemplate::new(&admin, None, ProductForm::default())
}

/// Create a product. A blank id gets the next generated `prod_NNNN` id; an
/// id that already exists is overwritten.
///
/// POST /products/new
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match validate(&form) {
        Ok(draft) => draft,
        Err(errors) => return Ok(ProductFormTemplate::new(&admin, None, form).rejected(errors)),
    };

    let repo = ProductRepository::new(state.pool());
    let product = match draft.id.clone() {
        Some(id) => repo.upsert(&draft.into_product(id, Utc::now())).await?,
        None => repo.insert_generated(&draft, Utc::now()).await?,
    };
    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product saved");

    Ok(Redirect::to("/products?notice=created").into_response())
}

/// Edit form for an existing product.
///
/// GET /products/{id}/edit
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn edit_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductFormTemplate> {
    let id = parse_id(&id)?;
    let product = ProductRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate::new(
        &admin,
        Some(&id),
        ProductForm::from_product(&product),
    ))
}

/// Save changes to an existing product. The id comes from the path; the id
/// field of the form is ignored.
///
/// POST /products/{id}/edit
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let form = ProductForm {
        id: id.to_string(),
        ..form
    };

    let draft = match validate(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(ProductFormTemplate::new(&admin, Some(&id), form).rejected(errors));
        }
    };

    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    repo.upsert(&draft.into_product(id, existing.created_at))
        .await?;
    tracing::info!(product_id = %existing.id, admin_id = %admin.id, "Product updated");

    Ok(Redirect::to("/products?notice=updated").into_response())
}

/// Delete a product.
///
/// POST /products/{id}/delete
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = parse_id(&id)?;

    match ProductRepository::new(state.pool()).delete(&id).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!(product_id = %id, admin_id = %admin.id, "Product deleted");

    Ok(Redirect::to("/products?notice=deleted"))
}
