use sea_orm::entity::prelude::*;

use crate::domain::catalog::Category;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub original_price: Option<i64>,
    pub image: String,
    pub category: Category,
    pub inventory: i32,
    /// JSON array of size labels.
    #[sea_orm(column_type = "JsonBinary")]
    pub sizes: Json,
    pub is_new_arrival: bool,
    pub is_sale: bool,
    pub discount: Option<i32>,
    pub rating: f64,
    pub reviews: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wishlist_items::Entity")]
    WishlistItems,
}

impl Related<super::wishlist_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
