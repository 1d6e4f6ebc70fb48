//! Catalog listing parameters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::PageRequest;

/// Products per catalog page.
pub const CATALOG_PAGE_SIZE: u32 = 12;

/// Catalog sort orders.
///
/// Each variant maps to a fixed `ORDER BY` clause, so sorting never
/// interpolates client input into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Name,
}

impl ProductSort {
    /// `ORDER BY` clause for the `products` table. Ties break on id for stable paging.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::Oldest => "created_at ASC, id ASC",
            Self::PriceLow => "price ASC, id ASC",
            Self::PriceHigh => "price DESC, id DESC",
            Self::Name => "title ASC, id ASC",
        }
    }
}

/// Invalid catalog filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("price filters cannot be negative")]
    NegativePrice,
    #[error("min_price ({min}) is greater than max_price ({max})")]
    InvertedPriceRange { min: Decimal, max: Decimal },
}

/// Query string accepted by catalog listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogQuery {
    /// Substring matched against title, description, and brand.
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
}

impl CatalogQuery {
    /// Trim text filters and drop the empty ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            q: non_empty(self.q),
            category: non_empty(self.category),
            brand: non_empty(self.brand),
            ..self
        }
    }

    /// Check the price range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a bound is negative or the range is inverted.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let negative = |p: Option<Decimal>| p.is_some_and(|p| p < Decimal::ZERO);
        if negative(self.min_price) || negative(self.max_price) {
            return Err(CatalogError::NegativePrice);
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(CatalogError::InvertedPriceRange { min, max });
        }
        Ok(())
    }

    /// The page this query asks for, at the fixed catalog page size.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, Some(CATALOG_PAGE_SIZE), CATALOG_PAGE_SIZE)
    }
}

/// Trim a text filter, mapping blank input to `None`.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// `ILIKE` pattern matching `term` as a literal substring.
///
/// `\`, `%` and `_` in the term are escaped with Postgres' default `\`
/// escape character.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sort_is_newest() {
        let query: CatalogQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, ProductSort::Newest);
        assert_eq!(query.sort.order_by(), "created_at DESC, id DESC");
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let query: CatalogQuery = serde_json::from_str(r#"{"sort":"price_high"}"#).unwrap();
        assert_eq!(query.sort, ProductSort::PriceHigh);
        assert!(serde_json::from_str::<CatalogQuery>(r#"{"sort":"random"}"#).is_err());
    }

    #[test]
    fn test_normalized_drops_blank_filters() {
        let query = CatalogQuery {
            q: Some("  trail  ".to_string()),
            category: Some("   ".to_string()),
            brand: Some(String::new()),
            ..CatalogQuery::default()
        }
        .normalized();

        assert_eq!(query.q.as_deref(), Some("trail"));
        assert_eq!(query.category, None);
        assert_eq!(query.brand, None);
    }

    #[test]
    fn test_validate_price_range() {
        let ok = CatalogQuery {
            min_price: Some(Decimal::new(100, 0)),
            max_price: Some(Decimal::new(100, 0)),
            ..CatalogQuery::default()
        };
        assert!(ok.validate().is_ok());

        let inverted = CatalogQuery {
            min_price: Some(Decimal::new(500, 0)),
            max_price: Some(Decimal::new(100, 0)),
            ..CatalogQuery::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(CatalogError::InvertedPriceRange { .. })
        ));

        let negative = CatalogQuery {
            min_price: Some(Decimal::new(-1, 0)),
            ..CatalogQuery::default()
        };
        assert_eq!(negative.validate(), Err(CatalogError::NegativePrice));
    }

    #[test]
    fn test_page_request_uses_fixed_page_size() {
        let query = CatalogQuery {
            page: Some(3),
            ..CatalogQuery::default()
        };
        let req = query.page_request();
        assert_eq!(req.per_page(), CATALOG_PAGE_SIZE);
        assert_eq!(req.offset(), 24);
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("trail"), "%trail%");
        assert_eq!(contains_pattern("%"), "%\\%%");
        assert_eq!(contains_pattern("air_max"), "%air\\_max%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
