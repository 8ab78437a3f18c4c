//! Cached catalog reads.
//!
//! Products are read from the database and cached in memory using `moka`
//! (5-minute TTL). The admin panel writes through its own process, so a saved
//! product shows up here once the cached entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use coza_core::{CategoryFilter, Product, ProductId};

use crate::db::{ProductRepository, RepositoryError};

/// Number of products on the home page grid.
pub const FEATURED_LIMIT: usize = 8;

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

const ALL_PRODUCTS_KEY: &str = "products:all";

/// Read access to the product catalog.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<String, CacheValue>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    fn repo(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }

    async fn cached_list(&self, key: &str) -> Option<Arc<Vec<Product>>> {
        match self.inner.cache.get(key).await {
            Some(CacheValue::Products(products)) => {
                debug!(key, "Cache hit for product list");
                Some(products)
            }
            _ => None,
        }
    }

    /// Every product, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(products) = self.cached_list(ALL_PRODUCTS_KEY).await {
            return Ok(products);
        }

        let products = Arc::new(self.repo().list_all().await?);
        self.inner
            .cache
            .insert(
                ALL_PRODUCTS_KEY.to_string(),
                CacheValue::Products(Arc::clone(&products)),
            )
            .await;

        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        // The full list is usually warm from the shop page.
        if let Some(products) = self.cached_list(ALL_PRODUCTS_KEY).await {
            return Ok(products.iter().find(|p| &p.id == id).cloned());
        }

        let product = self.repo().get(id).await?;
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }

    /// Products in one category. `"All"` (any case) returns everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let CategoryFilter::Only(name) = CategoryFilter::parse(category) else {
            return self.all_products().await;
        };

        let cache_key = format!("category:{}", name.to_lowercase());
        if let Some(products) = self.cached_list(&cache_key).await {
            return Ok(products);
        }

        let products = Arc::new(self.repo().list_by_category(&name).await?);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Up to `limit` featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    #[instrument(skip(self))]
    pub async fn featured_products(
        &self,
        limit: usize,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let cache_key = format!("featured:{limit}");
        if let Some(products) = self.cached_list(&cache_key).await {
            return Ok(products);
        }

        let limit_param = i64::try_from(limit).unwrap_or(i64::MAX);
        let products = Arc::new(self.repo().list_featured(limit_param).await?);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Seed the cache so handlers can be exercised without a database.
    #[cfg(test)]
    pub(crate) async fn prime(&self, products: Vec<Product>) {
        let featured: Vec<Product> = products
            .iter()
            .filter(|p| p.featured)
            .take(FEATURED_LIMIT)
            .cloned()
            .collect();
        self.inner
            .cache
            .insert(
                format!("featured:{FEATURED_LIMIT}"),
                CacheValue::Products(Arc::new(featured)),
            )
            .await;
        self.inner
            .cache
            .insert(
                ALL_PRODUCTS_KEY.to_string(),
                CacheValue::Products(Arc::new(products)),
            )
            .await;
    }
}
