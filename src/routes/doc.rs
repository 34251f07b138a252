use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{
            CreateOrderRequest, MarkPaidRequest, OrderList, OrderWithItems, Payer,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
        users::{UpdateUserRequest, UserList},
        wishlist::AddToWishlistRequest,
    },
    models::{
        Cart, CartItem, Order, OrderItem, PaymentResult, Product, ProductRef, ProductSummary,
        ShippingAddress, User, Wishlist,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products, users, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::create_order,
        orders::my_orders,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        orders::mark_order_paid,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        admin::list_low_stock,
        admin::adjust_inventory
    ),
    components(
        schemas(
            User,
            Product,
            ProductSummary,
            ProductRef,
            Cart,
            CartItem,
            ShippingAddress,
            PaymentResult,
            Order,
            OrderItem,
            Wishlist,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            MarkPaidRequest,
            Payer,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            AddToWishlistRequest,
            UpdateUserRequest,
            UserList,
            ProductList,
            OrderList,
            OrderWithItems,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            params::UserListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Order>,
            ApiResponse<Wishlist>,
            ApiResponse<User>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Catalog browsing and administration"),
        (name = "Cart", description = "Shopping cart of the current user"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Wishlist", description = "Saved products of the current user"),
        (name = "Users", description = "Account profiles and user administration"),
        (name = "Admin", description = "Inventory administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
