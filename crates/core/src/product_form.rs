//! Admin product form validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{PRODUCT_CATEGORIES, Product};
use crate::types::{Price, PriceError, ProductId, ProductIdError};

/// A single product form field error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductFormError {
    #[error("invalid product id: {0}")]
    InvalidId(#[from] ProductIdError),
    #[error("name is required")]
    MissingName,
    #[error("invalid price: {0}")]
    InvalidPrice(PriceError),
    #[error("invalid original price: {0}")]
    InvalidOriginalPrice(PriceError),
    #[error("price must be below $10,000,000,000 with at most 2 decimal places")]
    PriceOutOfRange,
    #[error("original price must be below $10,000,000,000 with at most 2 decimal places")]
    OriginalPriceOutOfRange,
    #[error("image URL is required")]
    MissingImage,
    #[error("image URL must start with http://, https:// or /")]
    InvalidImage,
    #[error("unknown category: {0}")]
    InvalidCategory(String),
    #[error("rating must be a number between 0 and 5 with at most 2 decimal places")]
    InvalidRating,
    #[error("reviews must be a whole number from 0 to 2147483647")]
    InvalidReviews,
    #[error("stock must be a whole number from 0 to 2147483647")]
    InvalidStock,
}

/// Raw product form as posted by the admin panel.
///
/// Checkbox fields are present only when checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub id: String,
    pub name: String,
    pub price: String,
    pub original_price: String,
    pub image: String,
    pub category: String,
    pub rating: String,
    pub reviews: String,
    pub stock: String,
    pub description: String,
    pub is_sale: Option<String>,
    pub is_new: Option<String>,
}

/// A validated product, not yet given an id or creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// `None` when the admin left the id blank.
    pub id: Option<ProductId>,
    pub name: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub image: String,
    pub category: String,
    pub rating: Decimal,
    pub reviews: u32,
    pub stock: u32,
    pub is_sale: bool,
    pub is_new: bool,
    pub description: String,
}

impl ProductDraft {
    /// Build the stored product. `featured` is derived from the new and sale
    /// flags.
    #[must_use]
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            original_price: self.original_price,
            image: self.image,
            category: self.category,
            rating: self.rating,
            reviews: self.reviews,
            stock: self.stock,
            featured: self.is_new || self.is_sale,
            is_sale: self.is_sale,
            is_new: self.is_new,
            description: self.description,
            created_at,
        }
    }
}

/// Normalize a pasted image URL.
///
/// Trims whitespace, strips surrounding quotes, and repairs a scheme that lost
/// one of its slashes (`https:/host` becomes `https://host`).
///
/// ```
/// use coza_core::product_form::clean_image_url;
///
/// assert_eq!(clean_image_url(" 'https:/cdn.test/a.jpg' "), "https://cdn.test/a.jpg");
/// assert_eq!(clean_image_url("\"/images/a.jpg\""), "/images/a.jpg");
/// ```
#[must_use]
pub fn clean_image_url(raw: &str) -> String {
    let url = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    for scheme in ["https:", "http:"] {
        if let Some(rest) = url.strip_prefix(scheme)
            && !rest.starts_with("//")
        {
            return format!("{scheme}//{}", rest.trim_start_matches('/'));
        }
    }

    url.to_owned()
}

/// Decimal places kept by the price and rating columns.
const STORED_SCALE: u32 = 2;

/// Whether `price` fits a `NUMERIC(12, 2)` column without rounding.
fn is_storable_price(price: Price) -> bool {
    let amount = price.amount().normalize();
    amount.scale() <= STORED_SCALE && amount < Decimal::from(10_000_000_000_i64)
}

/// Parse a count that must fit a signed 32-bit column.
fn parse_count(raw: &str, error: ProductFormError, errors: &mut Vec<ProductFormError>) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    raw.parse::<u32>()
        .ok()
        .filter(|n| i32::try_from(*n).is_ok())
        .unwrap_or_else(|| {
            errors.push(error);
            0
        })
}

impl ProductForm {
    /// Prefill the form from an existing product, for the edit page.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            original_price: product
                .original_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            image: product.image.clone(),
            category: product.category.clone(),
            rating: product.rating.to_string(),
            reviews: product.reviews.to_string(),
            stock: product.stock.to_string(),
            description: product.description.clone(),
            is_sale: product.is_sale.then(|| "on".to_owned()),
            is_new: product.is_new.then(|| "on".to_owned()),
        }
    }

    /// Validate every field, collecting all errors.
    ///
    /// Blank rating, reviews and stock default to zero.
    ///
    /// # Errors
    ///
    /// Returns the list of field errors if any field is invalid.
    pub fn validate(&self) -> Result<ProductDraft, Vec<ProductFormError>> {
        let mut errors = Vec::new();

        let id = match self.id.trim() {
            "" => None,
            raw => ProductId::parse(raw)
                .map_err(|e| errors.push(e.into()))
                .ok(),
        };

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push(ProductFormError::MissingName);
        }

        let price = Price::parse(&self.price)
            .map_err(|e| errors.push(ProductFormError::InvalidPrice(e)))
            .ok();
        if price.is_some_and(|p| !is_storable_price(p)) {
            errors.push(ProductFormError::PriceOutOfRange);
        }

        let original_price = match self.original_price.trim() {
            "" => None,
            raw => Price::parse(raw)
                .map_err(|e| errors.push(ProductFormError::InvalidOriginalPrice(e)))
                .ok(),
        };
        if original_price.is_some_and(|p| !is_storable_price(p)) {
            errors.push(ProductFormError::OriginalPriceOutOfRange);
        }

        let image = clean_image_url(&self.image);
        if image.is_empty() {
            errors.push(ProductFormError::MissingImage);
        } else if !(image.starts_with("https://")
            || image.starts_with("http://")
            || image.starts_with('/'))
        {
            errors.push(ProductFormError::InvalidImage);
        }

        let category = PRODUCT_CATEGORIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(self.category.trim()))
            .map(|c| (*c).to_owned());
        if category.is_none() {
            errors.push(ProductFormError::InvalidCategory(
                self.category.trim().to_owned(),
            ));
        }

        let rating = match self.rating.trim() {
            "" => Some(Decimal::ZERO),
            raw => raw
                .parse::<Decimal>()
                .ok()
                .map(|r| r.normalize())
                .filter(|r| {
                    *r >= Decimal::ZERO && *r <= Decimal::from(5) && r.scale() <= STORED_SCALE
                }),
        };
        if rating.is_none() {
            errors.push(ProductFormError::InvalidRating);
        }

        let reviews = parse_count(&self.reviews, ProductFormError::InvalidReviews, &mut errors);
        let stock = parse_count(&self.stock, ProductFormError::InvalidStock, &mut errors);

        match (price, category, rating) {
            (Some(price), Some(category), Some(rating)) if errors.is_empty() => Ok(ProductDraft {
                id,
                name,
                price,
                original_price,
                image,
                category,
                rating,
                reviews,
                stock,
                is_sale: self.is_sale.is_some(),
                is_new: self.is_new.is_some(),
                description: self.description.trim().to_owned(),
            }),
            _ => Err(errors),
        }
    }
}
