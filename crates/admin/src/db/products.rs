//! Product repository (read and write side).
//!
//! Saving a product with an id that already exists overwrites the stored
//! document; only `created_at` survives the overwrite. Generated ids are
//! never overwritten: a taken id is skipped and the next one tried.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};
use tracing::instrument;

use coza_core::catalog::LOW_STOCK_THRESHOLD;
use coza_core::product_form::ProductDraft;
use coza_core::{Price, Product, ProductId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, name, price, original_price, image, category, rating, \
     reviews, stock, is_sale, is_new, featured, description, created_at";

const INSERT_PRODUCT: &str = "INSERT INTO products \
       (id, name, price, original_price, image, category, rating, reviews, stock, \
        is_sale, is_new, featured, description, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)";

/// Attempts at claiming a generated id before giving up.
const GENERATED_ID_ATTEMPTS: usize = 5;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
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

        Ok(Self {
            id: ProductId::parse(&row.id).map_err(|e| corrupt("id", e.to_string()))?,
            price: Price::new(row.price).map_err(|e| corrupt("price", e.to_string()))?,
            original_price: row
                .original_price
                .map(Price::new)
                .transpose()
                .map_err(|e| corrupt("original price", e.to_string()))?,
            reviews: u32::try_from(row.reviews).map_err(|e| corrupt("reviews", e.to_string()))?,
            stock: u32::try_from(row.stock).map_err(|e| corrupt("stock", e.to_string()))?,
            name: row.name,
            image: row.image,
            category: row.category,
            rating: row.rating,
            is_sale: row.is_sale,
            is_new: row.is_new,
            featured: row.featured,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

/// Escape `LIKE` wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Next free `prod_NNNN` number given the highest one in use.
fn next_generated_number(highest: Option<i64>) -> u64 {
    highest.map_or(0, |n| n.max(0).unsigned_abs()) + 1
}

fn to_i32(value: u32, what: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{what} out of range: {value}")))
}

/// Repository for product reads and writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products whose name or category contains `term` (case-insensitive),
    /// newest first. A blank term lists everything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE $1 = '%%' OR name ILIKE $1 OR category ILIKE $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
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

    /// Insert the product, or overwrite the stored one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert(&self, product: &Product) -> Result<Product, RepositoryError> {
        let sql = format!(
            "{INSERT_PRODUCT} \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, price = EXCLUDED.price, \
               original_price = EXCLUDED.original_price, image = EXCLUDED.image, \
               category = EXCLUDED.category, rating = EXCLUDED.rating, \
               reviews = EXCLUDED.reviews, stock = EXCLUDED.stock, \
               is_sale = EXCLUDED.is_sale, is_new = EXCLUDED.is_new, \
               featured = EXCLUDED.featured, description = EXCLUDED.description, \
               updated_at = now() \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row: ProductRow = bind_product(sqlx::query_as(&sql), product)?
            .fetch_one(self.pool)
            .await?;

        Product::try_from(row)
    }

    /// Insert the product only if its id is free. Returns `None` when another
    /// product already has the id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn insert_new(&self, product: &Product) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "{INSERT_PRODUCT} ON CONFLICT (id) DO NOTHING RETURNING {PRODUCT_COLUMNS}"
        );
        let row: Option<ProductRow> = bind_product(sqlx::query_as(&sql), product)?
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert `draft` under the next generated id. If a concurrent writer
    /// claims that id first, the following number is tried.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no free id could be claimed, or
    /// `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, draft))]
    pub async fn insert_generated(
        &self,
        draft: &ProductDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        for _ in 0..GENERATED_ID_ATTEMPTS {
            let id = self.next_generated_id().await?;
            let product = draft.clone().into_product(id, created_at);
            if let Some(saved) = self.insert_new(&product).await? {
                return Ok(saved);
            }
            tracing::debug!(product_id = %product.id, "Generated id already taken, retrying");
        }

        Err(RepositoryError::Conflict(
            "could not claim a free product id".to_string(),
        ))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has the id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?)
    }

    /// Number of products with stock below the low-stock threshold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock < $1")
                .bind(i64::from(LOW_STOCK_THRESHOLD))
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// The next unused generated id (`prod_0001`, `prod_0002`, ...).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn next_generated_id(&self) -> Result<ProductId, RepositoryError> {
        // 18 digits always fit in a bigint
        let highest: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(substring(id FROM '^prod_([0-9]{1,18})$')::bigint) FROM products",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::generated(next_generated_number(highest)))
    }
}

fn bind_product<'q>(
    query: QueryAs<'q, Postgres, ProductRow, PgArguments>,
    product: &'q Product,
) -> Result<QueryAs<'q, Postgres, ProductRow, PgArguments>, RepositoryError> {
    Ok(query
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.original_price.map(|p| p.amount()))
        .bind(&product.image)
        .bind(&product.category)
        .bind(product.rating)
        .bind(to_i32(product.reviews, "reviews")?)
        .bind(to_i32(product.stock, "stock")?)
        .bind(product.is_sale)
        .bind(product.is_new)
        .bind(product.featured)
        .bind(&product.description)
        .bind(product.created_at))
}
