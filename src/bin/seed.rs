use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{create_pool, migrate, orm_from_pool},
    domain::{
        catalog::{Category, Size},
        role::Role,
    },
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::auth_service::hash_password,
};

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    original_price: Option<i64>,
    image: &'static str,
    category: Category,
    inventory: i32,
    sizes: &'static [Size],
    is_new_arrival: bool,
    is_sale: bool,
    discount: Option<i32>,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Bridal Red Lehenga",
        description: "Hand-embroidered silk lehenga with dupatta",
        price: 2_499_900,
        original_price: Some(2_999_900),
        image: "/images/lehenga-red.jpg",
        category: Category::Lehengas,
        inventory: 8,
        sizes: &[Size::S, Size::M, Size::L],
        is_new_arrival: true,
        is_sale: true,
        discount: Some(17),
    },
    SeedProduct {
        name: "Chikankari Cotton Kurti",
        description: "Lucknowi chikankari on breathable cotton",
        price: 149_900,
        original_price: None,
        image: "/images/kurti-chikankari.jpg",
        category: Category::Kurtis,
        inventory: 40,
        sizes: &[Size::Xs, Size::S, Size::M, Size::L, Size::Xl, Size::Xxl],
        is_new_arrival: false,
        is_sale: false,
        discount: None,
    },
    SeedProduct {
        name: "Banarasi Dress Material",
        description: "Unstitched Banarasi brocade, 2.5m",
        price: 329_900,
        original_price: Some(399_900),
        image: "/images/banarasi.jpg",
        category: Category::DressMaterials,
        inventory: 15,
        sizes: &[Size::FreeSize],
        is_new_arrival: false,
        is_sale: true,
        discount: Some(18),
    },
    SeedProduct {
        name: "Georgette Suit Piece",
        description: "Three-piece georgette suit with printed dupatta",
        price: 219_900,
        original_price: None,
        image: "/images/suit-georgette.jpg",
        category: Category::SuitsPieces,
        inventory: 3,
        sizes: &[Size::FreeSize],
        is_new_arrival: true,
        is_sale: false,
        discount: None,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;
    let orm = orm_from_pool(pool);

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin123", Role::Admin).await?;
    let user_id = ensure_user(&orm, "Shopper", "user@example.com", "user123", Role::User).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already exists");
        return Ok(existing.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for seed in PRODUCTS {
        let exists = Products::find()
            .filter(ProdCol::Name.eq(seed.name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            description: Set(Some(seed.description.to_string())),
            price: Set(seed.price),
            original_price: Set(seed.original_price),
            image: Set(seed.image.to_string()),
            category: Set(seed.category),
            inventory: Set(seed.inventory),
            sizes: Set(serde_json::to_value(seed.sizes)?),
            is_new_arrival: Set(seed.is_new_arrival),
            is_sale: Set(seed.is_sale),
            discount: Set(seed.discount),
            rating: Set(0.0),
            reviews: Set(0),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
