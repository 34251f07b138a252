//! Cart aggregate.
//!
//! A cart is a single document: an ordered list of lines plus a cached total.
//! Every mutation goes through this type so the total never drifts from the
//! lines it summarizes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::catalog::Size;

/// One purchase intent. `price` is captured when the line is created and is
/// not refreshed from the live product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: Size,
    pub quantity: i32,
    pub price: i64,
}

impl CartLine {
    /// `None` when `price * quantity` does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item {0} not found in cart")]
    LineNotFound(Uuid),
    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i32),
    #[error("Quantity for this item is too large")]
    QuantityTooLarge,
    #[error("Cart total is too large")]
    TotalTooLarge,
}

fn sum_lines(lines: &[CartLine]) -> Result<i64, CartError> {
    lines.iter().try_fold(0i64, |acc, line| {
        line.line_total()
            .and_then(|t| acc.checked_add(t))
            .ok_or(CartError::TotalTooLarge)
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartAggregate {
    lines: Vec<CartLine>,
    total_price: i64,
}

impl CartAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<CartLine>) -> Result<Self, CartError> {
        let total_price = sum_lines(&lines)?;
        Ok(Self { lines, total_price })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Distinct product ids in line order.
    pub fn product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }

    /// Adds `quantity` of (product, size). An existing line for the same pair
    /// is incremented and keeps its original price; otherwise a new line is
    /// appended at `price`. Returns the id of the affected line. The cart is
    /// left untouched when the merged quantity or the total would overflow.
    pub fn add(
        &mut self,
        product_id: Uuid,
        size: Size,
        quantity: i32,
        price: i64,
    ) -> Result<Uuid, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut lines = self.lines.clone();
        let id = match lines
            .iter_mut()
            .find(|l| l.product_id == product_id && l.size == size)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::QuantityTooLarge)?;
                existing.id
            }
            None => {
                let id = Uuid::new_v4();
                lines.push(CartLine {
                    id,
                    product_id,
                    size,
                    quantity,
                    price,
                });
                id
            }
        };
        self.replace_lines(lines)?;
        Ok(id)
    }

    /// Overwrites the quantity of a line.
    pub fn set_quantity(&mut self, id: Uuid, quantity: i32) -> Result<(), CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut lines = self.lines.clone();
        let line = lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CartError::LineNotFound(id))?;
        line.quantity = quantity;
        self.replace_lines(lines)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == id)
            .ok_or(CartError::LineNotFound(id))?;
        let mut lines = self.lines.clone();
        let removed = lines.remove(index);
        self.replace_lines(lines)?;
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_price = 0;
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    fn replace_lines(&mut self, lines: Vec<CartLine>) -> Result<(), CartError> {
        self.total_price = sum_lines(&lines)?;
        self.lines = lines;
        Ok(())
    }
}
