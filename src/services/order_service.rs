use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::CartAggregate, order_status::OrderStatus, payment::PaymentMethod,
        stock::verify_lines,
    },
    dto::orders::{
        CreateOrderRequest, MarkPaidRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest,
    },
    entity::{
        carts::{Column as CartCol, Entity as Carts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, PaymentResult, ShippingAddress},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::save_cart,
        convert::{
            cart_aggregate, encode_json, order_from_entity, order_item_from_entity, stock_level,
        },
    },
    state::AppState,
};

struct CheckoutInput {
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
    notes: Option<String>,
}

fn validate_checkout(payload: CreateOrderRequest) -> AppResult<CheckoutInput> {
    let missing =
        || AppError::Validation("Please provide shipping address and payment method".into());

    let address = payload.shipping_address.ok_or_else(missing)?;
    let method = payload
        .payment_method
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(missing)?;

    let fields = [
        ("street", &address.street),
        ("city", &address.city),
        ("state", &address.state),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ];
    if let Some((field, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "Shipping address {field} is required"
        )));
    }

    let payment_method = method.parse::<PaymentMethod>().map_err(AppError::Validation)?;

    Ok(CheckoutInput {
        shipping_address: address,
        payment_method,
        notes: payload.notes.filter(|n| !n.trim().is_empty()),
    })
}

/// Converts the caller's cart into an order.
///
/// Runs in one transaction: the cart and its products are read under row
/// locks, every line is checked against live inventory before anything is
/// written, then the order is inserted, inventory is decremented and the
/// cart is emptied. A decrement that would take inventory below zero rolls
/// the whole conversion back.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let input = validate_checkout(payload)?;

    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::EmptyCart)?;
    let aggregate = cart_aggregate(&cart)?;
    if aggregate.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(aggregate.product_ids()))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let levels = products
        .values()
        .map(|p| stock_level(p).map(|level| (p.id, level)))
        .collect::<AppResult<HashMap<_, _>>>()?;

    if let Err(err) = verify_lines(aggregate.lines(), &levels) {
        tracing::info!(user_id = %user.user_id, error = %err, "checkout rejected by stock check");
        return Err(err.into());
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        shipping_address: Set(encode_json(&input.shipping_address, "shipping address")?),
        payment_method: Set(input.payment_method),
        notes: Set(input.notes),
        total_price: Set(cart.total_price),
        status: Set(OrderStatus::Processing),
        is_paid: Set(false),
        paid_at: Set(None),
        payment_result: Set(None),
        is_delivered: Set(false),
        delivered_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(aggregate.lines().len());
    for (position, line) in aggregate.lines().iter().enumerate() {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::InsufficientStock {
                product: format!("Product {}", line.product_id),
            })?;
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            position: Set(position as i32),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            image: Set(product.image.clone()),
            size: Set(line.size),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    for line in aggregate.lines() {
        let result = Products::update_many()
            .col_expr(
                ProdCol::Inventory,
                Expr::col(ProdCol::Inventory).sub(line.quantity),
            )
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Inventory.gte(line.quantity))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let name = products
                .get(&line.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("Product {}", line.product_id));
            tracing::warn!(
                user_id = %user.user_id,
                order_id = %order.id,
                product_id = %line.product_id,
                quantity = line.quantity,
                "inventory decrement failed, rolling back checkout"
            );
            txn.rollback().await?;
            return Err(AppError::InsufficientStock { product: name });
        }
    }

    save_cart(&txn, cart, &CartAggregate::new()).await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.id,
        total_price = order.total_price,
        lines = items.len(),
        "order placed"
    );

    audit::record(
        &state.orm,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": order.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn load_items<C: ConnectionTrait>(db: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Position)
        .all(db)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();
    Ok(items)
}

async fn find_order<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Order"))
}

async fn list_with(
    state: &AppState,
    condition: Condition,
    query: &OrderListQuery,
) -> AppResult<(Vec<Order>, Meta)> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = condition;
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok((orders, Meta::new(page, limit, total)))
}

pub async fn my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    let (items, meta) = list_with(state, condition, &query).await?;
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (items, meta) = list_with(state, Condition::all(), &query).await?;
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Owners see their own orders; administrators see any order.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_order(&state.orm, id).await?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let items = load_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = payload
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Please provide status".into()))?
        .parse::<OrderStatus>()
        .map_err(AppError::Validation)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let previous = existing.status;
    let status = previous.transition_to(next)?;
    let now = Utc::now();

    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    if status == OrderStatus::Delivered {
        active.is_delivered = Set(true);
        active.delivered_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = previous.as_str(),
        to = status.as_str(),
        "order status changed"
    );

    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Records a payment confirmation. Independent of the order's status.
pub async fn mark_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MarkPaidRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    if existing.is_paid {
        return Err(AppError::Validation("Order already paid".into()));
    }

    let result = PaymentResult {
        id: payload.id,
        status: payload.status,
        update_time: payload.update_time,
        email_address: payload.payer.and_then(|p| p.email_address),
    };
    let now = Utc::now();

    let mut active: OrderActive = existing.into();
    active.is_paid = Set(true);
    active.paid_at = Set(Some(now.into()));
    active.payment_result = Set(Some(encode_json(&result, "payment result")?));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}
