mod common;

use sea_orm::EntityTrait;
use storefront_api::{
    domain::{catalog::Size, order_status::OrderStatus, payment::PaymentMethod, role::Role},
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, MarkPaidRequest, Payer, UpdateOrderStatusRequest},
        products::UpdateProductRequest,
    },
    entity::Carts,
    error::AppError,
    routes::params::OrderListQuery,
    services::{cart_service, order_service, product_service},
};

use common::{checkout, create_product, create_user, inventory_of, order_count, setup_state};

fn add(product_id: uuid::Uuid, quantity: i32, size: &str) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity,
        size: size.into(),
    }
}

#[tokio::test]
async fn checkout_converts_cart_and_decrements_inventory() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "asha@example.com", Role::User).await?;
    let product = create_product(&state, "Kurti A", 100, 5, &[Size::M, Size::L]).await?;

    cart_service::add_item(&state, &user, add(product.id, 2, "M")).await?;

    let resp = order_service::create_order(&state, &user, checkout("COD")).await?;
    let placed = resp.data.expect("order data");

    assert_eq!(placed.order.total_price, 200);
    assert_eq!(placed.order.status, OrderStatus::Processing);
    assert_eq!(placed.order.payment_method, PaymentMethod::Cod);
    assert!(!placed.order.is_paid);
    assert!(!placed.order.is_delivered);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].name, "Kurti A");
    assert_eq!(placed.items[0].size, Size::M);
    assert_eq!(placed.items[0].quantity, 2);
    assert_eq!(placed.items[0].price, 100);

    assert_eq!(inventory_of(&state, product.id).await?, 3);

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_leaves_everything_untouched() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "ravi@example.com", Role::User).await?;
    let product = create_product(&state, "Kurti B", 150, 10, &[Size::M]).await?;

    cart_service::add_item(&state, &user, add(product.id, 10, "M")).await?;

    // Stock drops after the item was added.
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            inventory: Some(3),
            ..Default::default()
        },
    )
    .await?;

    let err = order_service::create_order(&state, &user, checkout("UPI"))
        .await
        .err();
    match err {
        Some(AppError::InsufficientStock { product: name }) => assert_eq!(name, "Kurti B"),
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(inventory_of(&state, product.id).await?, 3);
    assert_eq!(order_count(&state).await?, 0);
    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price, 1500);
    Ok(())
}

#[tokio::test]
async fn one_short_line_fails_the_whole_checkout() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "meera@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let plenty = create_product(&state, "Lehenga", 500, 10, &[Size::L]).await?;
    let scarce = create_product(&state, "Suit", 300, 5, &[Size::FreeSize]).await?;

    cart_service::add_item(&state, &user, add(plenty.id, 2, "L")).await?;
    cart_service::add_item(&state, &user, add(scarce.id, 4, "Free Size")).await?;
    product_service::update_product(
        &state,
        &admin,
        scarce.id,
        UpdateProductRequest {
            inventory: Some(1),
            ..Default::default()
        },
    )
    .await?;

    let result = order_service::create_order(&state, &user, checkout("Card")).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    assert_eq!(inventory_of(&state, plenty.id).await?, 10);
    assert_eq!(inventory_of(&state, scarce.id).await?, 1);
    assert_eq!(order_count(&state).await?, 0);
    Ok(())
}

#[tokio::test]
async fn product_deleted_before_checkout_fails_the_whole_checkout() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "nisha@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let kept = create_product(&state, "Saree", 700, 6, &[Size::FreeSize]).await?;
    let gone = create_product(&state, "Anarkali", 900, 4, &[Size::M]).await?;

    cart_service::add_item(&state, &user, add(kept.id, 2, "Free Size")).await?;
    cart_service::add_item(&state, &user, add(gone.id, 1, "M")).await?;
    product_service::delete_product(&state, &admin, gone.id).await?;

    let result = order_service::create_order(&state, &user, checkout("COD")).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    assert_eq!(order_count(&state).await?, 0);
    assert_eq!(inventory_of(&state, kept.id).await?, 6);
    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_price, 2300);
    Ok(())
}

#[tokio::test]
async fn two_sizes_of_one_product_cannot_overdraw_inventory() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "kavya@example.com", Role::User).await?;
    let product = create_product(&state, "Kurti C", 120, 3, &[Size::M, Size::L]).await?;

    // Each line fits on its own; together they need 4 of 3.
    cart_service::add_item(&state, &user, add(product.id, 2, "M")).await?;
    cart_service::add_item(&state, &user, add(product.id, 2, "L")).await?;

    let result = order_service::create_order(&state, &user, checkout("COD")).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    assert_eq!(inventory_of(&state, product.id).await?, 3);
    assert_eq!(order_count(&state).await?, 0);
    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_or_missing_cart_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "nina@example.com", Role::User).await?;

    let result = order_service::create_order(&state, &user, checkout("COD")).await;
    assert!(matches!(result, Err(AppError::EmptyCart)));

    // A cart that exists but holds nothing.
    cart_service::get_cart(&state, &user).await?;
    let result = order_service::create_order(&state, &user, checkout("COD")).await;
    assert!(matches!(result, Err(AppError::EmptyCart)));
    assert_eq!(order_count(&state).await?, 0);
    Ok(())
}

#[tokio::test]
async fn checkout_input_is_validated_before_touching_stock() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "tara@example.com", Role::User).await?;
    let product = create_product(&state, "Kurti D", 80, 4, &[Size::S]).await?;
    cart_service::add_item(&state, &user, add(product.id, 1, "S")).await?;

    let missing = order_service::create_order(&state, &user, CreateOrderRequest::default()).await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    let unknown = order_service::create_order(&state, &user, checkout("Cheque")).await;
    assert!(matches!(unknown, Err(AppError::Validation(_))));

    assert_eq!(inventory_of(&state, product.id).await?, 4);
    assert_eq!(order_count(&state).await?, 0);
    Ok(())
}

#[tokio::test]
async fn order_items_keep_their_snapshot_after_product_edits() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "isha@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti E", 250, 6, &[Size::Xl]).await?;

    cart_service::add_item(&state, &user, add(product.id, 1, "XL")).await?;
    let placed = order_service::create_order(&state, &user, checkout("COD"))
        .await?
        .data
        .expect("order");

    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed Kurti".into()),
            price: Some(999),
            ..Default::default()
        },
    )
    .await?;
    product_service::delete_product(&state, &admin, product.id).await?;

    let fetched = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].name, "Kurti E");
    assert_eq!(fetched.items[0].price, 250);
    assert_eq!(fetched.items[0].product_id, product.id);
    assert_eq!(fetched.order.total_price, 250);
    Ok(())
}

#[tokio::test]
async fn order_total_uses_cart_prices_not_current_prices() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "zara@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti F", 100, 5, &[Size::M]).await?;

    cart_service::add_item(&state, &user, add(product.id, 3, "M")).await?;
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            price: Some(140),
            ..Default::default()
        },
    )
    .await?;

    let stored = Carts::find()
        .one(&state.orm)
        .await?
        .expect("cart row")
        .total_price;

    let placed = order_service::create_order(&state, &user, checkout("COD"))
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.total_price, stored);
    assert_eq!(placed.order.total_price, 300);
    assert_eq!(placed.items[0].price, 100);
    Ok(())
}

#[tokio::test]
async fn status_transitions_follow_the_lifecycle() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "diya@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti G", 90, 5, &[Size::M]).await?;
    cart_service::add_item(&state, &user, add(product.id, 1, "M")).await?;
    let order_id = order_service::create_order(&state, &user, checkout("COD"))
        .await?
        .data
        .expect("order")
        .order
        .id;

    let status = |s: &str| UpdateOrderStatusRequest {
        status: Some(s.into()),
    };

    let forbidden = order_service::update_status(&state, &user, order_id, status("Shipped")).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let missing =
        order_service::update_status(&state, &admin, order_id, UpdateOrderStatusRequest::default())
            .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    let shipped = order_service::update_status(&state, &admin, order_id, status("Shipped"))
        .await?
        .data
        .expect("order");
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(!shipped.is_delivered);

    let delivered = order_service::update_status(&state, &admin, order_id, status("Delivered"))
        .await?
        .data
        .expect("order");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.is_delivered);
    assert!(delivered.delivered_at.is_some());

    let backwards =
        order_service::update_status(&state, &admin, order_id, status("Processing")).await;
    assert!(matches!(
        backwards,
        Err(AppError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Processing
        })
    ));
    Ok(())
}

#[tokio::test]
async fn cancelling_does_not_restock() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "leela@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti H", 90, 5, &[Size::M]).await?;
    cart_service::add_item(&state, &user, add(product.id, 2, "M")).await?;
    let order_id = order_service::create_order(&state, &user, checkout("COD"))
        .await?
        .data
        .expect("order")
        .order
        .id;

    let cancelled = order_service::update_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: Some("Cancelled".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(inventory_of(&state, product.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn payment_is_recorded_once() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "riya@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti I", 60, 5, &[Size::S]).await?;
    cart_service::add_item(&state, &user, add(product.id, 1, "S")).await?;
    let order_id = order_service::create_order(&state, &user, checkout("Card"))
        .await?
        .data
        .expect("order")
        .order
        .id;

    let payment = || MarkPaidRequest {
        id: Some("pay_123".into()),
        status: Some("COMPLETED".into()),
        update_time: Some("2025-01-01T10:00:00Z".into()),
        payer: Some(Payer {
            email_address: Some("riya@example.com".into()),
        }),
    };

    let paid = order_service::mark_paid(&state, &admin, order_id, payment())
        .await?
        .data
        .expect("order");
    assert!(paid.is_paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.status, OrderStatus::Processing);
    let result = paid.payment_result.expect("payment result");
    assert_eq!(result.id.as_deref(), Some("pay_123"));
    assert_eq!(result.email_address.as_deref(), Some("riya@example.com"));

    let again = order_service::mark_paid(&state, &admin, order_id, payment()).await;
    assert!(matches!(again, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn orders_are_visible_to_owner_and_admin_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = create_user(&state, "owner@example.com", Role::User).await?;
    let other = create_user(&state, "other@example.com", Role::User).await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let product = create_product(&state, "Kurti J", 70, 5, &[Size::M]).await?;
    cart_service::add_item(&state, &owner, add(product.id, 1, "M")).await?;
    let order_id = order_service::create_order(&state, &owner, checkout("COD"))
        .await?
        .data
        .expect("order")
        .order
        .id;

    assert!(order_service::get_order(&state, &owner, order_id).await.is_ok());
    assert!(order_service::get_order(&state, &admin, order_id).await.is_ok());
    assert!(matches!(
        order_service::get_order(&state, &other, order_id).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        order_service::get_order(&state, &owner, uuid::Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));

    let mine = order_service::my_orders(&state, &owner, OrderListQuery::default())
        .await?;
    assert_eq!(mine.data.expect("orders").items.len(), 1);
    assert_eq!(mine.meta.and_then(|m| m.total), Some(1));

    let theirs = order_service::my_orders(&state, &other, OrderListQuery::default()).await?;
    assert!(theirs.data.expect("orders").items.is_empty());

    assert!(matches!(
        order_service::list_orders(&state, &owner, OrderListQuery::default()).await,
        Err(AppError::Forbidden)
    ));
    let all = order_service::list_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some(OrderStatus::Processing),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(all.data.expect("orders").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn cart_row_survives_checkout() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "anu@example.com", Role::User).await?;
    let product = create_product(&state, "Kurti K", 40, 5, &[Size::M]).await?;
    cart_service::add_item(&state, &user, add(product.id, 1, "M")).await?;
    order_service::create_order(&state, &user, checkout("COD")).await?;

    let carts = Carts::find().all(&state.orm).await?;
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0].total_price, 0);
    Ok(())
}
