//! Stock checks run against live inventory before a cart line is accepted or
//! a cart is converted into an order.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use super::{cart::CartLine, catalog::Size};

/// The slice of a product the stock checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub name: String,
    pub inventory: i32,
    pub sizes: Vec<Size>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("product {product_id} no longer exists")]
    Missing { product_id: Uuid },
    #[error("{name} has {available} in stock, {requested} requested")]
    Insufficient {
        product_id: Uuid,
        name: String,
        requested: i32,
        available: i32,
    },
    #[error("size {size} is not offered for {name}")]
    InvalidSize { name: String, size: String },
}

pub fn ensure_available(level: &StockLevel, requested: i32) -> Result<(), StockError> {
    if level.inventory < requested {
        return Err(StockError::Insufficient {
            product_id: level.product_id,
            name: level.name.clone(),
            requested,
            available: level.inventory,
        });
    }
    Ok(())
}

pub fn ensure_size(level: &StockLevel, size: Size) -> Result<(), StockError> {
    if !level.sizes.contains(&size) {
        return Err(StockError::InvalidSize {
            name: level.name.clone(),
            size: size.as_str().to_string(),
        });
    }
    Ok(())
}

/// Checks every line against its product before anything is written. Each
/// line is compared with the product's inventory on its own; the first
/// missing or understocked product fails the whole cart.
pub fn verify_lines(
    lines: &[CartLine],
    levels: &HashMap<Uuid, StockLevel>,
) -> Result<(), StockError> {
    for line in lines {
        let level = levels.get(&line.product_id).ok_or(StockError::Missing {
            product_id: line.product_id,
        })?;
        ensure_available(level, line.quantity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(inventory: i32) -> StockLevel {
        StockLevel {
            product_id: Uuid::new_v4(),
            name: "Cotton Kurti".into(),
            inventory,
            sizes: vec![Size::S, Size::M],
        }
    }

    fn line(product_id: Uuid, quantity: i32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            product_id,
            size: Size::M,
            quantity,
            price: 100,
        }
    }

    #[test]
    fn exact_inventory_is_enough() {
        assert_eq!(ensure_available(&level(2), 2), Ok(()));
    }

    #[test]
    fn short_inventory_names_the_product() {
        let err = ensure_available(&level(3), 10).unwrap_err();
        match err {
            StockError::Insufficient {
                name,
                requested,
                available,
                ..
            } => {
                assert_eq!(name, "Cotton Kurti");
                assert_eq!(requested, 10);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn size_must_be_offered() {
        let l = level(5);
        assert_eq!(ensure_size(&l, Size::M), Ok(()));
        assert!(matches!(
            ensure_size(&l, Size::Xxl),
            Err(StockError::InvalidSize { .. })
        ));
    }

    #[test]
    fn one_short_line_fails_the_cart() {
        let plenty = level(10);
        let scarce = level(1);
        let lines = vec![line(plenty.product_id, 2), line(scarce.product_id, 2)];
        let levels = HashMap::from([
            (plenty.product_id, plenty.clone()),
            (scarce.product_id, scarce.clone()),
        ]);

        let err = verify_lines(&lines, &levels).unwrap_err();
        assert!(matches!(
            err,
            StockError::Insufficient { product_id, .. } if product_id == scarce.product_id
        ));
    }

    #[test]
    fn missing_product_fails_the_cart() {
        let gone = Uuid::new_v4();
        let err = verify_lines(&[line(gone, 1)], &HashMap::new()).unwrap_err();
        assert_eq!(err, StockError::Missing { product_id: gone });
    }
}
