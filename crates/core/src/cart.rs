//! Shopping cart held in the visitor's session.
//!
//! A line is identified by `(product_id, size)`: the same product in two
//! sizes is two lines. Prices stored on lines are display snapshots only;
//! checkout reprices every line from the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ProductId;
use crate::catalog::non_empty;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Invalid cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,
    #[error("item is not in the cart")]
    LineNotFound,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: u32,
    /// Product title when the line was added.
    pub title: String,
    /// Unit price when the line was added.
    pub unit_price: Decimal,
}

/// Blank and whitespace-padded sizes name the same line as their trimmed form.
fn size_key(size: Option<&str>) -> Option<&str> {
    size.map(str::trim).filter(|s| !s.is_empty())
}

impl CartLine {
    fn matches(&self, product_id: ProductId, size: Option<&str>) -> bool {
        self.product_id == product_id && size_key(self.size.as_deref()) == size_key(size)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An ordered list of cart lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Add a line, merging into an existing line for the same product and size.
    ///
    /// Merged quantities saturate at [`MAX_LINE_QUANTITY`]. The snapshot on an
    /// existing line is refreshed from the new one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `line.quantity` is 0 or too large.
    pub fn add(&mut self, mut line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        line.size = non_empty(line.size);

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, line.size.as_deref()))
        {
            existing.quantity = (existing.quantity + line.quantity).min(MAX_LINE_QUANTITY);
            existing.title = line.title;
            existing.unit_price = line.unit_price;
        } else {
            self.lines.push(line);
        }
        Ok(())
    }

    /// Remove the line for a product and size. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId, size: Option<&str>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, size));
        self.lines.len() != before
    }

    /// Set a line's quantity. A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line does not exist and
    /// `CartError::InvalidQuantity` if `quantity` is above the limit.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        size: Option<&str>,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return if self.remove(product_id, size) {
                Ok(())
            } else {
                Err(CartError::LineNotFound)
            };
        }

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= MAX_LINE_QUANTITY)
            .ok_or(CartError::InvalidQuantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, size))
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
