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
    catalog::ProductType,
    dto::{
        admin::{
            self as admin_dto, BirthdayPromoRun, BulkAddProductsRequest, DeleteProductsRequest,
            DeletedCount, MonthlyOrderTotal, MonthlyOrderTotals, NewProduct, NewVariant, ProductKey,
            SortOrderEntry, UpdateOrderStatusRequest, UpdateProductRequest, UpdateSortOrderRequest,
            UpdatedCount, UserList, UserWithOrderCount,
        },
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        cart::{AddToCartRequest, CartItemChange, CartItemRequest, CartLineView, CartView},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UserOrderItemView, UserOrderList, UserOrderView},
        products::{ProductList, ProductView},
        promo::{CreatePublicPromoRequest, PromoDiscount, ValidatePromoRequest},
    },
    entity::orders::OrderStatus,
    models::{CartItem, Order, OrderItem, Product, ProductImage, ProductVariant, PromoCode, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products as product_routes, promo},
    shipping::GovernorateRate,
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
        auth::login,
        auth::register,
        auth::get_profile,
        auth::update_profile,
        product_routes::list_products,
        product_routes::list_by_type,
        product_routes::featured,
        product_routes::new_arrivals,
        product_routes::get_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::increment_item,
        cart::decrement_item,
        cart::delete_item,
        promo::validate_promo,
        orders::checkout,
        orders::list_user_orders,
        orders::get_user_order,
        orders::list_governorates,
        admin::bulk_add_products,
        admin::update_product,
        admin::delete_products,
        admin::update_sort_order,
        admin::create_public_promo,
        admin::list_all_orders,
        admin::monthly_totals,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::list_low_stock,
        admin::run_birthday_promos
    ),
    components(
        schemas(
            User,
            Product,
            ProductType,
            ProductVariant,
            ProductImage,
            ProductView,
            ProductList,
            CartItem,
            CartView,
            CartLineView,
            CartItemChange,
            AddToCartRequest,
            CartItemRequest,
            Order,
            OrderItem,
            OrderStatus,
            OrderList,
            OrderWithItems,
            CheckoutRequest,
            UserOrderList,
            UserOrderView,
            UserOrderItemView,
            GovernorateRate,
            PromoCode,
            PromoDiscount,
            ValidatePromoRequest,
            CreatePublicPromoRequest,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            NewProduct,
            NewVariant,
            ProductKey,
            BulkAddProductsRequest,
            UpdateProductRequest,
            DeleteProductsRequest,
            DeletedCount,
            SortOrderEntry,
            UpdateSortOrderRequest,
            UpdatedCount,
            UpdateOrderStatusRequest,
            admin_dto::LowStockQuery,
            admin_dto::ProductList,
            MonthlyOrderTotal,
            MonthlyOrderTotals,
            BirthdayPromoRun,
            UserList,
            UserWithOrderCount,
            params::Pagination,
            params::SortOrder,
            params::OrderListQuery,
            Meta,
            ApiResponse<ProductView>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<admin_dto::ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Promo", description = "Promo code endpoints"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication and profile endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
