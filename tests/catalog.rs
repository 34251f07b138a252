mod common;

use storefront_api::{
    domain::{
        catalog::{Category, Size},
        role::Role,
    },
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppError,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::product_service,
};
use uuid::Uuid;

use common::{create_user, setup_state};

fn product(name: &str, category: Category, price: i64) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: Some(format!("Handwoven {name}")),
        price,
        original_price: None,
        image: "/images/p.jpg".into(),
        category,
        inventory: 10,
        sizes: None,
        is_new_arrival: Some(category == Category::Lehengas),
        is_sale: None,
        discount: None,
        rating: None,
        reviews: None,
    }
}

#[tokio::test]
async fn listing_filters_searches_and_sorts() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    for (name, category, price) in [
        ("Silk Lehenga", Category::Lehengas, 9000),
        ("Cotton Kurti", Category::Kurtis, 1200),
        ("Silk Kurti", Category::Kurtis, 2500),
    ] {
        product_service::create_product(&state, &admin, product(name, category, price)).await?;
    }

    let kurtis = product_service::list_products(
        &state,
        ProductQuery {
            category: Some(Category::Kurtis),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let names: Vec<_> = kurtis
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Cotton Kurti", "Silk Kurti"]);

    let silk = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("SILK".into()),
            max_price: Some(5000),
            ..Default::default()
        },
    )
    .await?;
    let items = silk.data.expect("list").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Silk Kurti");

    let fresh = product_service::list_products(
        &state,
        ProductQuery {
            is_new_arrival: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(fresh.data.expect("list").items[0].category, Category::Lehengas);

    let paged = product_service::list_products(
        &state,
        ProductQuery {
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(paged.data.expect("list").items.len(), 1);
    assert_eq!(paged.meta.and_then(|m| m.total), Some(3));
    Ok(())
}

#[tokio::test]
async fn created_products_default_to_free_size() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;

    let created = product_service::create_product(
        &state,
        &admin,
        product("Plain Kurti", Category::Kurtis, 900),
    )
    .await?
    .data
    .expect("product");
    assert_eq!(created.sizes, vec![Size::FreeSize]);
    Ok(())
}

#[tokio::test]
async fn catalog_writes_are_admin_only_and_validated() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await?;
    let user = create_user(&state, "user@example.com", Role::User).await?;

    let forbidden = product_service::create_product(
        &state,
        &user,
        product("Kurti", Category::Kurtis, 100),
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let mut bad = product("Kurti", Category::Kurtis, 100);
    bad.discount = Some(150);
    let invalid = product_service::create_product(&state, &admin, bad).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));

    let created = product_service::create_product(
        &state,
        &admin,
        product("Kurti", Category::Kurtis, 100),
    )
    .await?
    .data
    .expect("product");

    let negative = product_service::update_product(
        &state,
        &admin,
        created.id,
        UpdateProductRequest {
            inventory: Some(-1),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));

    let no_sizes = product_service::update_product(
        &state,
        &admin,
        created.id,
        UpdateProductRequest {
            sizes: Some(vec![]),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(no_sizes, Err(AppError::Validation(_))));

    assert!(matches!(
        product_service::get_product(&state, Uuid::new_v4()).await,
        Err(AppError::NotFound("Product"))
    ));
    assert!(matches!(
        product_service::delete_product(&state, &admin, Uuid::new_v4()).await,
        Err(AppError::NotFound("Product"))
    ));
    Ok(())
}
