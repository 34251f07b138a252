#![allow(dead_code)]

use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, EntityTrait, Schema, Set,
};
use uuid::Uuid;

use storefront_api::{
    config::AuthSettings,
    domain::{
        catalog::{Category, Size},
        role::Role,
    },
    dto::orders::CreateOrderRequest,
    entity::{
        AuditLogs, Carts, OrderItems, Orders, Products, Users, WishlistItems,
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::ShippingAddress,
    services::product_service::find_product,
    state::AppState,
};

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 1,
    }
}

/// Fresh in-memory SQLite database with every table created from the
/// entities. One connection keeps the database alive for the whole test.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .sqlx_logging(false);
    let orm = Database::connect(opts).await?;

    let backend = orm.get_database_backend();
    let schema = Schema::new(backend);
    let tables = [
        schema.create_table_from_entity(Users),
        schema.create_table_from_entity(Products),
        schema.create_table_from_entity(Carts),
        schema.create_table_from_entity(Orders),
        schema.create_table_from_entity(OrderItems),
        schema.create_table_from_entity(WishlistItems),
        schema.create_table_from_entity(AuditLogs),
    ];
    for table in &tables {
        orm.execute(backend.build(table)).await?;
    }

    Ok(AppState::new(orm, auth_settings(), 5))
}

pub async fn create_user(state: &AppState, email: &str, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    inventory: i32,
    sizes: &[Size],
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} for testing"))),
        price: Set(price),
        original_price: Set(None),
        image: Set(format!("/images/{}.jpg", name.to_lowercase().replace(' ', "-"))),
        category: Set(Category::Kurtis),
        inventory: Set(inventory),
        sizes: Set(serde_json::to_value(sizes)?),
        is_new_arrival: Set(false),
        is_sale: Set(false),
        discount: Set(None),
        rating: Set(0.0),
        reviews: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn inventory_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    Ok(find_product(&state.orm, id).await?.inventory)
}

pub async fn order_count(state: &AppState) -> anyhow::Result<usize> {
    Ok(Orders::find().all(&state.orm).await?.len())
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        street: "12 MG Road".into(),
        city: "Jaipur".into(),
        state: "Rajasthan".into(),
        postal_code: "302001".into(),
        country: "India".into(),
    }
}

pub fn checkout(method: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        shipping_address: Some(address()),
        payment_method: Some(method.into()),
        notes: None,
    }
}
