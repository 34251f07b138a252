use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::catalog::{Category, Size},
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub original_price: Option<i64>,
    pub image: String,
    pub category: Category,
    pub inventory: i32,
    pub sizes: Option<Vec<Size>>,
    pub is_new_arrival: Option<bool>,
    pub is_sale: Option<bool>,
    pub discount: Option<i32>,
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub original_price: Option<i64>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub inventory: Option<i32>,
    pub sizes: Option<Vec<Size>>,
    pub is_new_arrival: Option<bool>,
    pub is_sale: Option<bool>,
    pub discount: Option<i32>,
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
