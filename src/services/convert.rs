//! Entity → API model conversions shared by the services.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    domain::{
        cart::{CartAggregate, CartLine},
        catalog::Size,
        stock::StockLevel,
    },
    entity::{
        carts::Model as CartModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel, products::Model as ProductModel, users::Model as UserModel,
    },
    error::AppResult,
    models::{Order, OrderItem, PaymentResult, Product, ProductSummary, ShippingAddress, User},
};

fn decode_json<T: DeserializeOwned>(value: Value, what: &str) -> AppResult<T> {
    let decoded = serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("stored {what} is malformed: {e}"))?;
    Ok(decoded)
}

pub fn encode_json<T: serde::Serialize>(value: &T, what: &str) -> AppResult<Value> {
    let encoded =
        serde_json::to_value(value).map_err(|e| anyhow::anyhow!("cannot encode {what}: {e}"))?;
    Ok(encoded)
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn sizes_of(model: &ProductModel) -> AppResult<Vec<Size>> {
    decode_json(model.sizes.clone(), "product sizes")
}

pub fn product_from_entity(model: ProductModel) -> AppResult<Product> {
    let sizes = sizes_of(&model)?;
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        original_price: model.original_price,
        image: model.image,
        category: model.category,
        inventory: model.inventory,
        sizes,
        is_new_arrival: model.is_new_arrival,
        is_sale: model.is_sale,
        discount: model.discount,
        rating: model.rating,
        reviews: model.reviews,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub fn product_summary(model: &ProductModel) -> ProductSummary {
    ProductSummary {
        id: model.id,
        name: model.name.clone(),
        image: model.image.clone(),
        price: model.price,
        inventory: model.inventory,
    }
}

pub fn stock_level(model: &ProductModel) -> AppResult<StockLevel> {
    Ok(StockLevel {
        product_id: model.id,
        name: model.name.clone(),
        inventory: model.inventory,
        sizes: sizes_of(model)?,
    })
}

pub fn cart_aggregate(model: &CartModel) -> AppResult<CartAggregate> {
    let lines: Vec<CartLine> = decode_json(model.items.clone(), "cart items")?;
    Ok(CartAggregate::from_lines(lines)?)
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let shipping_address: ShippingAddress =
        decode_json(model.shipping_address, "shipping address")?;
    let payment_result: Option<PaymentResult> = model
        .payment_result
        .map(|value| decode_json(value, "payment result"))
        .transpose()?;
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        shipping_address,
        payment_method: model.payment_method,
        notes: model.notes,
        total_price: model.total_price,
        status: model.status,
        is_paid: model.is_paid,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        payment_result,
        is_delivered: model.is_delivered,
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        image: model.image,
        size: model.size,
        quantity: model.quantity,
        price: model.price,
    }
}
