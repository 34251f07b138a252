use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Category {
    #[sea_orm(string_value = "Dress Materials")]
    #[serde(rename = "Dress Materials")]
    DressMaterials,
    #[sea_orm(string_value = "Lehengas")]
    Lehengas,
    #[sea_orm(string_value = "Kurtis")]
    Kurtis,
    #[sea_orm(string_value = "Suits Pieces")]
    #[serde(rename = "Suits Pieces")]
    SuitsPieces,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Size {
    #[sea_orm(string_value = "XS")]
    #[serde(rename = "XS")]
    Xs,
    #[sea_orm(string_value = "S")]
    #[serde(rename = "S")]
    S,
    #[sea_orm(string_value = "M")]
    #[serde(rename = "M")]
    M,
    #[sea_orm(string_value = "L")]
    #[serde(rename = "L")]
    L,
    #[sea_orm(string_value = "XL")]
    #[serde(rename = "XL")]
    Xl,
    #[sea_orm(string_value = "XXL")]
    #[serde(rename = "XXL")]
    Xxl,
    #[sea_orm(string_value = "Free Size")]
    #[serde(rename = "Free Size")]
    FreeSize,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Xs => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::Xl => "XL",
            Size::Xxl => "XXL",
            Size::FreeSize => "Free Size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown size {0}")]
pub struct UnknownSize(pub String);

impl FromStr for Size {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "XS" => Ok(Size::Xs),
            "S" => Ok(Size::S),
            "M" => Ok(Size::M),
            "L" => Ok(Size::L),
            "XL" => Ok(Size::Xl),
            "XXL" => Ok(Size::Xxl),
            "Free Size" => Ok(Size::FreeSize),
            other => Err(UnknownSize(other.to_string())),
        }
    }
}

pub fn default_sizes() -> Vec<Size> {
    vec![Size::FreeSize]
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Please add a product name")]
    MissingName,
    #[error("Name cannot be more than {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("Description cannot be more than {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,
    #[error("Please add an image")]
    MissingImage,
    #[error("Price must be positive")]
    NegativePrice,
    #[error("Original price must be positive")]
    NegativeOriginalPrice,
    #[error("Inventory cannot be negative")]
    NegativeInventory,
    #[error("Product must offer at least one size")]
    NoSizes,
    #[error("Discount must be between 0 and 100")]
    DiscountOutOfRange,
    #[error("Rating must be between 0 and 5")]
    RatingOutOfRange,
    #[error("Reviews cannot be negative")]
    NegativeReviews,
}

/// The writable fields of a product, borrowed for validation before insert
/// or update.
#[derive(Debug, Clone, Copy)]
pub struct ProductDraft<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub image: &'a str,
    pub price: i64,
    pub original_price: Option<i64>,
    pub inventory: i32,
    pub sizes: &'a [Size],
    pub discount: Option<i32>,
    pub rating: f64,
    pub reviews: i32,
}

impl ProductDraft<'_> {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CatalogError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CatalogError::NameTooLong);
        }
        if self
            .description
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(CatalogError::DescriptionTooLong);
        }
        if self.image.trim().is_empty() {
            return Err(CatalogError::MissingImage);
        }
        if self.price < 0 {
            return Err(CatalogError::NegativePrice);
        }
        if self.original_price.is_some_and(|p| p < 0) {
            return Err(CatalogError::NegativeOriginalPrice);
        }
        if self.inventory < 0 {
            return Err(CatalogError::NegativeInventory);
        }
        if self.sizes.is_empty() {
            return Err(CatalogError::NoSizes);
        }
        if self.discount.is_some_and(|d| !(0..=100).contains(&d)) {
            return Err(CatalogError::DiscountOutOfRange);
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(CatalogError::RatingOutOfRange);
        }
        if self.reviews < 0 {
            return Err(CatalogError::NegativeReviews);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft<'static> {
        ProductDraft {
            name: "Silk Lehenga",
            description: Some("Hand embroidered"),
            image: "lehenga.jpg",
            price: 4_500,
            original_price: Some(5_000),
            inventory: 3,
            sizes: &[Size::M, Size::L],
            discount: Some(10),
            rating: 4.5,
            reviews: 12,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(draft().validate(), Ok(()));
    }

    #[test]
    fn rejects_negative_inventory_and_price() {
        let mut d = draft();
        d.inventory = -1;
        assert_eq!(d.validate(), Err(CatalogError::NegativeInventory));

        let mut d = draft();
        d.price = -5;
        assert_eq!(d.validate(), Err(CatalogError::NegativePrice));
    }

    #[test]
    fn rejects_out_of_range_discount_and_rating() {
        let mut d = draft();
        d.discount = Some(101);
        assert_eq!(d.validate(), Err(CatalogError::DiscountOutOfRange));

        let mut d = draft();
        d.rating = 5.5;
        assert_eq!(d.validate(), Err(CatalogError::RatingOutOfRange));
    }

    #[test]
    fn rejects_empty_sizes_and_long_name() {
        let mut d = draft();
        d.sizes = &[];
        assert_eq!(d.validate(), Err(CatalogError::NoSizes));

        let long = "x".repeat(MAX_NAME_LEN + 1);
        let mut d = draft();
        d.name = &long;
        assert_eq!(d.validate(), Err(CatalogError::NameTooLong));
    }

    #[test]
    fn size_parses_labels() {
        assert_eq!("Free Size".parse::<Size>(), Ok(Size::FreeSize));
        assert_eq!("XXL".parse::<Size>(), Ok(Size::Xxl));
        assert!("XXXL".parse::<Size>().is_err());
        assert_eq!(Size::Xl.as_str(), "XL");
    }
}
