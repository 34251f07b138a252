use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, ShippingAddress};

/// Fields are optional so that a missing address or payment method is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Payer {
    pub email_address: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub payer: Option<Payer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
