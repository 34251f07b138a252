use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::CartAggregate,
        catalog::Size,
        stock::{ensure_available, ensure_size},
    },
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, ProductRef},
    response::{ApiResponse, Meta},
    services::{
        convert::{cart_aggregate, encode_json, product_summary, stock_level},
        product_service::find_product,
    },
    state::AppState,
};

pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(cart)
}

async fn find_or_create_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(db, user_id).await? {
        return Ok(cart);
    }
    let now = Utc::now();
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        items: Set(serde_json::json!([])),
        total_price: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    tracing::debug!(user_id = %user_id, cart_id = %cart.id, "cart created");
    Ok(cart)
}

/// Writes the aggregate back as the cart's items and total.
pub async fn save_cart<C: ConnectionTrait>(
    db: &C,
    cart: CartModel,
    aggregate: &CartAggregate,
) -> AppResult<CartModel> {
    let items = encode_json(&aggregate.lines(), "cart items")?;
    let mut active: CartActive = cart.into();
    active.items = Set(items);
    active.total_price = Set(aggregate.total_price());
    active.updated_at = Set(Utc::now().into());
    let cart = active.update(db).await?;
    Ok(cart)
}

/// Attaches current product details to every line for display.
async fn resolve_cart<C: ConnectionTrait>(db: &C, cart: &CartModel) -> AppResult<Cart> {
    let aggregate = cart_aggregate(cart)?;
    let ids = aggregate.product_ids();
    let products: HashMap<Uuid, _> = if ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let items = aggregate
        .lines()
        .iter()
        .map(|line| CartItem {
            id: line.id,
            product: match products.get(&line.product_id) {
                Some(product) => ProductRef::Resolved(product_summary(product)),
                None => ProductRef::Unresolved {
                    id: line.product_id,
                },
            },
            quantity: line.quantity,
            size: line.size,
            price: line.price,
        })
        .collect();

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        items,
        total_price: cart.total_price,
        updated_at: cart.updated_at.with_timezone(&Utc),
    })
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = find_or_create_cart(&state.orm, user.user_id).await?;
    let cart = resolve_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("OK", cart, Some(Meta::empty())))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = find_product(&state.orm, payload.product_id).await?;
    let level = stock_level(&product)?;
    ensure_available(&level, payload.quantity)?;
    let size: Size = payload.size.parse().map_err(|_| AppError::InvalidSize {
        size: payload.size.clone(),
    })?;
    ensure_size(&level, size)?;

    let cart = find_or_create_cart(&state.orm, user.user_id).await?;
    let mut aggregate = cart_aggregate(&cart)?;
    let line_id = aggregate.add(product.id, size, payload.quantity, product.price)?;
    let cart = save_cart(&state.orm, cart, &aggregate).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_add",
        "carts",
        serde_json::json!({
            "product_id": product.id,
            "size": size.as_str(),
            "quantity": payload.quantity,
            "line_id": line_id,
        }),
    )
    .await;

    let cart = resolve_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Item added to cart", cart, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let cart = find_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let mut aggregate = cart_aggregate(&cart)?;
    let product_id = aggregate
        .line(item_id)
        .map(|line| line.product_id)
        .ok_or(AppError::NotFound("Cart item"))?;

    let product = find_product(&state.orm, product_id).await?;
    ensure_available(&stock_level(&product)?, payload.quantity)?;

    aggregate.set_quantity(item_id, payload.quantity)?;
    let cart = save_cart(&state.orm, cart, &aggregate).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "carts",
        serde_json::json!({ "line_id": item_id, "quantity": payload.quantity }),
    )
    .await;

    let cart = resolve_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Cart updated", cart, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let cart = find_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let mut aggregate = cart_aggregate(&cart)?;
    let removed = aggregate.remove(item_id)?;
    let cart = save_cart(&state.orm, cart, &aggregate).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "carts",
        serde_json::json!({ "line_id": item_id, "product_id": removed.product_id }),
    )
    .await;

    let cart = resolve_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success(
        "Item removed from cart",
        cart,
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = find_cart(&state.orm, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let cart = save_cart(&state.orm, cart, &CartAggregate::new()).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_clear",
        "carts",
        serde_json::json!({ "cart_id": cart.id }),
    )
    .await;

    let cart = resolve_cart(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Cart cleared", cart, Some(Meta::empty())))
}
