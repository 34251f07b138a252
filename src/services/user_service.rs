use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{UpdateUserRequest, UserList},
    entity::{
        carts::{Column as CartCol, Entity as Carts},
        orders::{Column as OrderCol, Entity as Orders},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
        wishlist_items::{Column as WishlistCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::UserListQuery,
    services::{auth_service::hash_password, convert::user_from_entity},
    state::AppState,
};

pub async fn find_user<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("User"))
}

fn ensure_self_or_admin(user: &AuthUser, id: Uuid) -> AppResult<()> {
    if user.user_id != id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Users::find();
    if let Some(role) = query.role {
        finder = finder.filter(UserCol::Role.eq(role));
    }
    let finder = finder.order_by_desc(UserCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", UserList { items }, Some(meta)))
}

pub async fn get_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_admin(user, id)?;
    let model = find_user(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "OK",
        user_from_entity(model),
        Some(Meta::empty()),
    ))
}

/// Updates name, email or password of the caller's own account, or of any
/// account when the caller is an admin. Role changes are admin-only.
pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_admin(user, id)?;
    if payload.role.is_some() {
        ensure_admin(user)?;
    }

    let existing = find_user(&state.orm, id).await?;
    let mut active = existing.into_active_model();

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::Validation("Email cannot be empty".into()));
        }
        let taken = Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .filter(UserCol::Id.ne(id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Validation("Email is already taken".to_string()));
        }
        active.email = Set(email);
    }
    if let Some(password) = payload.password {
        if password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".into()));
        }
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }

    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Removes an account with its cart and wishlist. Accounts that have placed
/// orders are kept so order history stays attached to a user.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if user.user_id == id {
        return Err(AppError::Validation(
            "Admins cannot delete their own account".into(),
        ));
    }

    let txn = state.orm.begin().await?;
    find_user(&txn, id).await?;

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .count(&txn)
        .await?;
    if orders > 0 {
        return Err(AppError::Validation(
            "User has orders and cannot be deleted".into(),
        ));
    }

    WishlistItems::delete_many()
        .filter(WishlistCol::UserId.eq(id))
        .exec(&txn)
        .await?;
    Carts::delete_many()
        .filter(CartCol::UserId.eq(id))
        .exec(&txn)
        .await?;
    Users::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(admin_id = %user.user_id, user_id = %id, "user deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
