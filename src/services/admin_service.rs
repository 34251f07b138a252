use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{InventoryAdjustRequest, ProductList},
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::LowStockQuery,
    services::convert::product_from_entity,
    state::AppState,
};

/// Products whose inventory is at or below the threshold, emptiest first.
pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(state.low_stock_threshold);
    if threshold < 0 {
        return Err(AppError::Validation("threshold cannot be negative".into()));
    }
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Inventory.lte(threshold))
        .order_by_asc(ProdCol::Inventory)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

/// Restock or write off inventory by a signed delta.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::Validation("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let inventory = product
        .inventory
        .checked_add(payload.delta)
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::Validation("inventory cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.inventory = Set(inventory);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        product_id = %updated.id,
        delta = payload.delta,
        inventory = updated.inventory,
        "inventory adjusted"
    );

    audit::record(
        &state.orm,
        user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        product_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}
