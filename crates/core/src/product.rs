//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProductId, UserId};

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Largest price the `NUMERIC(12, 2)` column holds.
/// (999_999_999_999 × 10⁻² = 9_999_999_999.99; `Decimal::new` is not `const`.)
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Prices are stored to the cent.
const PRICE_SCALE: u32 = 2;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub brand: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_active: bool,
    pub tags: Vec<String>,
    /// Admin who created the product. Cleared if that user is deleted.
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `size` is a valid choice for this product.
    ///
    /// Products without sizes accept only no size.
    #[must_use]
    pub fn accepts_size(&self, size: Option<&str>) -> bool {
        match size {
            None => self.sizes.is_empty(),
            Some(size) => self.sizes.iter().any(|s| s == size),
        }
    }

    /// Whether the product can be bought in `quantity` units right now.
    #[must_use]
    pub fn is_purchasable(&self, quantity: u32) -> bool {
        self.is_active && i64::from(self.stock) >= i64::from(quantity)
    }
}

/// Invalid product input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title must be at most {MAX_TITLE_LENGTH} characters")]
    TitleTooLong,
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("price cannot have more than two decimal places")]
    PriceTooPrecise,
    #[error("price must be at most {MAX_PRICE}")]
    PriceTooLarge,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("invalid image URL: {0}")]
    InvalidImageUrl(String),
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

const fn default_active() -> bool {
    true
}

impl ProductDraft {
    /// Validate and normalize the draft.
    ///
    /// Text fields are trimmed; sizes, colors, and tags are trimmed with blanks
    /// and duplicates removed (first occurrence wins).
    ///
    /// # Errors
    ///
    /// Returns `ProductError` for an empty or overlong title, a price `<= 0`,
    /// with fractions of a cent or beyond [`MAX_PRICE`], negative stock, or an image that is not an absolute http(s) URL.
    pub fn validate(self) -> Result<Self, ProductError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(ProductError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ProductError::TitleTooLong);
        }
        if self.price <= Decimal::ZERO {
            return Err(ProductError::NonPositivePrice);
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(ProductError::PriceTooPrecise);
        }
        if self.price > MAX_PRICE {
            return Err(ProductError::PriceTooLarge);
        }
        if self.stock < 0 {
            return Err(ProductError::NegativeStock);
        }

        let images = dedup_trimmed(self.images);
        if let Some(bad) = images.iter().find(|img| !is_http_url(img)) {
            return Err(ProductError::InvalidImageUrl(bad.clone()));
        }

        Ok(Self {
            title,
            description: self.description.trim().to_owned(),
            category: self.category.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            sizes: dedup_trimmed(self.sizes),
            colors: dedup_trimmed(self.colors),
            images,
            tags: dedup_trimmed(self.tags),
            ..self
        })
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

fn dedup_trimmed(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_owned());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            title: "  Trail Runner 2  ".to_string(),
            description: "Lightweight trail shoe".to_string(),
            price: Decimal::new(459_900, 2),
            category: "Shoes".to_string(),
            brand: "Stride".to_string(),
            sizes: vec!["41".into(), " 42 ".into(), "41".into(), String::new()],
            colors: vec!["black".into()],
            images: vec!["https://cdn.stridewell.shop/p/1.jpg".into()],
            stock: 5,
            is_active: true,
            tags: vec!["trail".into(), "trail".into()],
        }
    }

    #[test]
    fn test_validate_normalizes_lists_and_title() {
        let valid = draft().validate().unwrap();
        assert_eq!(valid.title, "Trail Runner 2");
        assert_eq!(valid.sizes, vec!["41", "42"]);
        assert_eq!(valid.tags, vec!["trail"]);
    }

    #[test]
    fn test_validate_rejects_bad_price_and_stock() {
        let mut d = draft();
        d.price = Decimal::ZERO;
        assert_eq!(d.validate(), Err(ProductError::NonPositivePrice));

        let mut d = draft();
        d.stock = -1;
        assert_eq!(d.validate(), Err(ProductError::NegativeStock));
    }

    #[test]
    fn test_validate_rejects_prices_the_column_cannot_store() {
        let mut d = draft();
        d.price = "0.001".parse().unwrap();
        assert_eq!(d.validate(), Err(ProductError::PriceTooPrecise));

        let mut d = draft();
        d.price = "10000000000".parse().unwrap();
        assert_eq!(d.validate(), Err(ProductError::PriceTooLarge));

        let mut d = draft();
        d.price = "9999999999.99".parse().unwrap();
        assert_eq!(d.validate().unwrap().price, MAX_PRICE);

        let mut d = draft();
        d.price = "19.500".parse().unwrap();
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_and_long_titles() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert_eq!(d.validate(), Err(ProductError::EmptyTitle));

        let mut d = draft();
        d.title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(d.validate(), Err(ProductError::TitleTooLong));
    }

    #[test]
    fn test_validate_rejects_non_http_images() {
        let mut d = draft();
        d.images = vec!["javascript:alert(1)".to_string()];
        assert!(matches!(d.validate(), Err(ProductError::InvalidImageUrl(_))));

        let mut d = draft();
        d.images = vec!["/relative/path.png".to_string()];
        assert!(matches!(d.validate(), Err(ProductError::InvalidImageUrl(_))));
    }

    #[test]
    fn test_draft_defaults_when_deserializing() {
        let d: ProductDraft = serde_json::from_str(r#"{"title":"Socks","price":"199.00"}"#).unwrap();
        assert!(d.is_active);
        assert_eq!(d.stock, 0);
        assert!(d.sizes.is_empty());
    }

    #[test]
    fn test_accepts_size() {
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(1),
            title: "Tee".into(),
            description: String::new(),
            price: Decimal::ONE,
            category: String::new(),
            brand: String::new(),
            sizes: vec!["S".into(), "M".into()],
            colors: vec![],
            images: vec![],
            stock: 2,
            is_active: true,
            tags: vec![],
            owner_id: None,
            created_at: now,
            updated_at: now,
        };
        assert!(product.accepts_size(Some("M")));
        assert!(!product.accepts_size(Some("XL")));
        assert!(!product.accepts_size(None));
        assert!(product.is_purchasable(2));
        assert!(!product.is_purchasable(3));

        product.sizes.clear();
        assert!(product.accepts_size(None));
        product.is_active = false;
        assert!(!product.is_purchasable(1));
    }
}
