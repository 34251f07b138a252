use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::wishlist::AddToWishlistRequest,
    entity::{
        products::Entity as Products,
        wishlist_items::{ActiveModel as WishlistActive, Column as WishCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Wishlist,
    response::{ApiResponse, Meta},
    services::{convert::product_from_entity, product_service::find_product},
    state::AppState,
};

async fn load_wishlist(state: &AppState, user_id: Uuid) -> AppResult<Wishlist> {
    let products = WishlistItems::find()
        .filter(WishCol::UserId.eq(user_id))
        .order_by_desc(WishCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(_, product)| product)
        .map(product_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Wishlist { user_id, products })
}

pub async fn get_wishlist(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Wishlist>> {
    let wishlist = load_wishlist(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", wishlist, Some(Meta::empty())))
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddToWishlistRequest,
) -> AppResult<ApiResponse<Wishlist>> {
    find_product(&state.orm, payload.product_id).await?;

    let existing = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Product already in wishlist".into()));
    }

    WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "wishlist_add",
        "wishlist_items",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    let wishlist = load_wishlist(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Added to wishlist",
        wishlist,
        Some(Meta::empty()),
    ))
}

/// Removing a product that is not on the wishlist leaves it unchanged.
pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Wishlist>> {
    let result = WishlistItems::delete_many()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            &state.orm,
            user.user_id,
            "wishlist_remove",
            "wishlist_items",
            serde_json::json!({ "product_id": product_id }),
        )
        .await;
    }

    let wishlist = load_wishlist(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Removed from wishlist",
        wishlist,
        Some(Meta::empty()),
    ))
}
