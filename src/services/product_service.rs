use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    audit,
    domain::catalog::{ProductDraft, Size, default_sizes},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::convert::{encode_json, product_from_entity, sizes_of},
    state::AppState,
};

pub async fn find_product<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }
    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category));
    }
    if let Some(flag) = query.is_new_arrival {
        condition = condition.add(Column::IsNewArrival.eq(flag));
    }
    if let Some(flag) = query.is_sale {
        condition = condition.add(Column::IsSale.eq(flag));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Rating => Column::Rating,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

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
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(product)?,
        None,
    ))
}

fn dedup_sizes(sizes: Vec<Size>) -> Vec<Size> {
    let mut unique = Vec::with_capacity(sizes.len());
    for size in sizes {
        if !unique.contains(&size) {
            unique.push(size);
        }
    }
    unique
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let sizes = dedup_sizes(payload.sizes.unwrap_or_else(default_sizes));
    let rating = payload.rating.unwrap_or(0.0);
    let reviews = payload.reviews.unwrap_or(0);

    ProductDraft {
        name: &payload.name,
        description: payload.description.as_deref(),
        image: &payload.image,
        price: payload.price,
        original_price: payload.original_price,
        inventory: payload.inventory,
        sizes: &sizes,
        discount: payload.discount,
        rating,
        reviews,
    }
    .validate()?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        original_price: Set(payload.original_price),
        image: Set(payload.image),
        category: Set(payload.category),
        inventory: Set(payload.inventory),
        sizes: Set(encode_json(&sizes, "product sizes")?),
        is_new_arrival: Set(payload.is_new_arrival.unwrap_or(false)),
        is_sale: Set(payload.is_sale.unwrap_or(false)),
        discount: Set(payload.discount),
        rating: Set(rating),
        reviews: Set(reviews),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product)?,
        Some(Meta::empty()),
    ))
}

/// Overwrites the given fields. An inventory value set here replaces whatever
/// checkouts have done in the meantime.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = find_product(&state.orm, id).await?;

    let name = payload.name.unwrap_or_else(|| existing.name.clone());
    let description = payload.description.or_else(|| existing.description.clone());
    let image = payload.image.unwrap_or_else(|| existing.image.clone());
    let price = payload.price.unwrap_or(existing.price);
    let original_price = payload.original_price.or(existing.original_price);
    let inventory = payload.inventory.unwrap_or(existing.inventory);
    let sizes = match payload.sizes {
        Some(sizes) => dedup_sizes(sizes),
        None => sizes_of(&existing)?,
    };
    let discount = payload.discount.or(existing.discount);
    let rating = payload.rating.unwrap_or(existing.rating);
    let reviews = payload.reviews.unwrap_or(existing.reviews);

    ProductDraft {
        name: &name,
        description: description.as_deref(),
        image: &image,
        price,
        original_price,
        inventory,
        sizes: &sizes,
        discount,
        rating,
        reviews,
    }
    .validate()?;

    let category = payload.category.unwrap_or(existing.category);
    let is_new_arrival = payload.is_new_arrival.unwrap_or(existing.is_new_arrival);
    let is_sale = payload.is_sale.unwrap_or(existing.is_sale);

    let mut active: ActiveModel = existing.into();
    active.name = Set(name.trim().to_string());
    active.description = Set(description);
    active.image = Set(image);
    active.price = Set(price);
    active.original_price = Set(original_price);
    active.category = Set(category);
    active.inventory = Set(inventory);
    active.sizes = Set(encode_json(&sizes, "product sizes")?);
    active.is_new_arrival = Set(is_new_arrival);
    active.is_sale = Set(is_sale);
    active.discount = Set(discount);
    active.rating = Set(rating);
    active.reviews = Set(reviews);
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    audit::record(
        &state.orm,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
