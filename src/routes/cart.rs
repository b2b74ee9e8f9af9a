use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};

use crate::{
    dto::cart::{AddToCartRequest, CartItemChange, CartItemRequest, CartView},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/item/increment", put(increment_item))
        .route("/item/decrement", put(decrement_item))
        .route("/item/delete", delete(delete_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart with priced lines", body = ApiResponse<CartView>),
        (status = 404, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add an item or merge it into an existing line", body = ApiResponse<CartView>),
        (status = 400, description = "Invalid quantity, size, variant or not enough stock"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/item/increment",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Quantity increased by one", body = ApiResponse<CartItemChange>),
        (status = 400, description = "Not enough stock available"),
        (status = 403, description = "Item belongs to another user"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn increment_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemChange>>> {
    let resp = cart_service::increment_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/item/decrement",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Quantity decreased; the line is removed at zero", body = ApiResponse<CartItemChange>),
        (status = 403, description = "Item belongs to another user"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn decrement_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemChange>>> {
    let resp = cart_service::decrement_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/item/delete",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartItemChange>),
        (status = 403, description = "Item belongs to another user"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemChange>>> {
    let resp = cart_service::delete_item(&state, &user, payload).await?;
    Ok(Json(resp))
}
