//! Purchase statistics for shoppers and the back-office dashboard.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;

/// Number of brands reported in [`UserStats::favorite_brands`].
pub const FAVORITE_BRAND_COUNT: usize = 3;

/// Number of products reported in [`AdminStats::top_selling_products`].
pub const TOP_SELLING_COUNT: usize = 5;

/// A shopper's purchase summary. Only completed payments count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Distinct products purchased.
    pub total_products: i64,
    pub total_purchases: i64,
    pub total_spent: Decimal,
    pub favorite_brands: Vec<String>,
}

/// One row of the top sellers list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct TopSellingProduct {
    pub product_id: ProductId,
    pub title: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

/// Back-office dashboard figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_products: i64,
    /// Completed payments.
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub top_selling_products: Vec<TopSellingProduct>,
}

/// Rank brands by how often they were purchased.
///
/// Blank brands are ignored. Ties are broken alphabetically and at most
/// [`FAVORITE_BRAND_COUNT`] brands are returned.
#[must_use]
pub fn rank_brands<'a>(brands: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for brand in brands.into_iter().map(str::trim).filter(|b| !b.is_empty()) {
        *counts.entry(brand).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(FAVORITE_BRAND_COUNT)
        .map(|(brand, _)| brand.to_owned())
        .collect()
}
