//! Product repository (read side).
//!
//! The storefront never writes products; the admin panel and CLI seeder own
//! the collection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use coza_core::{Price, Product, ProductId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, price, original_price, image, category, rating, \
     reviews, stock, is_sale, is_new, featured, description, created_at";

/// Raw `products` row.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    price: Decimal,
    original_price: Option<Decimal>,
    image: String,
    category: String,
    rating: Decimal,
    reviews: i32,
    stock: i32,
    is_sale: bool,
    is_new: bool,
    featured: bool,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            RepositoryError::DataCorruption(format!("product {}: invalid {what}: {detail}", row.id))
        };

        let id = ProductId::parse(&row.id).map_err(|e| corrupt("id", e.to_string()))?;
        let price = Price::new(row.price).map_err(|e| corrupt("price", e.to_string()))?;
        let original_price = row
            .original_price
            .map(Price::new)
            .transpose()
            .map_err(|e| corrupt("original price", e.to_string()))?;
        let reviews = u32::try_from(row.reviews).map_err(|e| corrupt("reviews", e.to_string()))?;
        let stock = u32::try_from(row.stock).map_err(|e| corrupt("stock", e.to_string()))?;

        Ok(Self {
            id,
            name: row.name,
            price,
            original_price,
            image: row.image,
            category: row.category,
            rating: row.rating,
            reviews,
            stock,
            is_sale: row.is_sale,
            is_new: row.is_new,
            featured: row.featured,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Products whose category equals `category`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE lower(category) = lower($1) ORDER BY created_at, id"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Up to `limit` featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE featured ORDER BY created_at DESC, id LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }
}
