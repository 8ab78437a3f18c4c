//! Seed the product catalog from YAML.
//!
//! Every entry goes through the same validation as the admin product form,
//! so a seed file cannot store anything the admin panel would reject. The
//! whole file is validated before the database is touched. Entries whose id
//! already exists are overwritten; a blank id gets the next generated
//! `prod_NNNN` id.
//!
//! ```yaml
//! - id: prod_0001
//!   name: Esprit Ruffle Shirt
//!   price: "16.64"
//!   original_price: "24.99"
//!   image: https://images.example.com/shirt.jpg
//!   category: Women
//!   rating: "4.5"
//!   reviews: 128
//!   stock: 24
//!   is_sale: true
//! ```

use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use coza_admin::db::{self, ProductRepository, RepositoryError};
use coza_core::product_form::{ProductDraft, ProductForm};

/// The preset catalog shipped with the CLI.
const BUNDLED_CATALOG: &str = include_str!("../../data/products.yaml");

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: ADMIN_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid product(s) in seed file")]
    Invalid(usize),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One product entry in a seed file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub description: String,
}

impl From<SeedProduct> for ProductForm {
    fn from(seed: SeedProduct) -> Self {
        let flag = |on: bool| on.then(|| "on".to_owned());
        Self {
            id: seed.id,
            name: seed.name,
            price: seed.price.to_string(),
            original_price: seed
                .original_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            image: seed.image,
            category: seed.category,
            rating: seed.rating.to_string(),
            reviews: seed.reviews.to_string(),
            stock: seed.stock.to_string(),
            description: seed.description,
            is_sale: flag(seed.is_sale),
            is_new: flag(seed.is_new),
        }
    }
}

/// Parse and validate a seed file, reporting every invalid entry.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid` if
/// any entry fails validation.
pub fn parse_catalog(yaml: &str) -> Result<Vec<ProductDraft>, SeedError> {
    let entries: Vec<SeedProduct> = serde_yaml::from_str(yaml)?;

    let mut drafts = Vec::with_capacity(entries.len());
    let mut invalid = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        let label = if entry.id.is_empty() {
            format!("#{}", index + 1)
        } else {
            entry.id.clone()
        };

        match ProductForm::from(entry).validate() {
            Ok(draft) => drafts.push(draft),
            Err(errors) => {
                invalid += 1;
                for err in errors {
                    error!(product = %label, "{err}");
                }
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(drafts)
}

async fn read_catalog(file: Option<&str>) -> Result<String, SeedError> {
    let Some(file) = file else {
        info!("Using bundled preset catalog");
        return Ok(BUNDLED_CATALOG.to_owned());
    };

    let path = Path::new(file);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file.to_owned()));
    }

    info!(path = %file, "Loading products from file");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file.to_owned(),
            source,
        })
}

/// Upsert products from `file`, or from the bundled catalog when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a database
/// operation fails.
pub async fn products(file: Option<&str>) -> Result<(), SeedError> {
    let yaml = read_catalog(file).await?;

    // Validate before connecting to the database
    let drafts = parse_catalog(&yaml)?;
    info!(products = drafts.len(), "Seed file validated");

    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repo = ProductRepository::new(&pool);
    let now = Utc::now();

    for draft in drafts {
        let product = match draft.id.clone() {
            Some(id) => repo.upsert(&draft.into_product(id, now)).await?,
            None => repo.insert_generated(&draft, now).await?,
        };
        info!(product_id = %product.id, name = %product.name, "Seeded");
    }

    info!("Seeding complete!");
    Ok(())
}
