use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            BirthdayPromoRun, BulkAddProductsRequest, DeleteProductsRequest, DeletedCount,
            LowStockQuery, MonthlyOrderTotals, ProductList, UpdateOrderStatusRequest,
            UpdateProductRequest, UpdateSortOrderRequest, UpdatedCount, UserList,
        },
        orders::{OrderList, OrderWithItems},
        promo::CreatePublicPromoRequest,
    },
    error::AppResult,
    jobs,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, Product, PromoCode},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, promo_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            post(bulk_add_products)
                .put(update_product)
                .delete(delete_products),
        )
        .route("/products/sort-order", post(update_sort_order))
        .route("/promo-codes", post(create_public_promo))
        .route("/orders", get(list_all_orders))
        .route("/orders/stats/monthly", get(monthly_totals))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/users", get(list_users))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/jobs/birthday-promos", post(run_birthday_promos))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = BulkAddProductsRequest,
    responses(
        (status = 201, description = "Products created with their variants and images", body = ApiResponse<ProductList>),
        (status = 400, description = "Invalid product data"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "A product with the same name and type exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn bulk_add_products(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BulkAddProductsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductList>>)> {
    let resp = admin_service::bulk_add_products(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/products",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Update stock, price or the new flag", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::update_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products",
    request_body = DeleteProductsRequest,
    responses(
        (status = 200, description = "Products deleted", body = ApiResponse<DeletedCount>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No matching products found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_products(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteProductsRequest>,
) -> AppResult<Json<ApiResponse<DeletedCount>>> {
    let resp = admin_service::delete_products(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/sort-order",
    request_body = UpdateSortOrderRequest,
    responses(
        (status = 200, description = "Sort order updated", body = ApiResponse<UpdatedCount>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_sort_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSortOrderRequest>,
) -> AppResult<Json<ApiResponse<UpdatedCount>>> {
    let resp = admin_service::update_sort_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/promo-codes",
    request_body = CreatePublicPromoRequest,
    responses(
        (status = 201, description = "Public promo code created", body = ApiResponse<PromoCode>),
        (status = 400, description = "Invalid discount, expiry or code"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_public_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePublicPromoRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PromoCode>>)> {
    let resp = promo_service::create_public_promo(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Pending, Shipped, Delivered or Cancelled"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/stats/monthly",
    responses(
        (status = 200, description = "Order count and revenue per month", body = ApiResponse<MonthlyOrderTotals>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn monthly_totals(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MonthlyOrderTotals>>> {
    let resp = admin_service::monthly_totals(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get any order with items (admin only)", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Users with their order counts", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("threshold" = Option<i32>, Query, description = "Stock threshold, default 5"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List low stock products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/jobs/birthday-promos",
    responses(
        (status = 200, description = "Issue today's birthday promo codes now", body = ApiResponse<BirthdayPromoRun>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn run_birthday_promos(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BirthdayPromoRun>>> {
    ensure_admin(&user)?;
    let issued = jobs::issue_birthday_promos(&state, Utc::now().date_naive()).await?;
    Ok(Json(ApiResponse::success(
        "Birthday promos issued",
        BirthdayPromoRun { issued },
        Some(Meta::empty()),
    )))
}
