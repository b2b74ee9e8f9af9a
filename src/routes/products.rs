use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{ProductList, ProductTypeQuery, ProductView},
    error::AppResult,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/type", get(list_by_type))
        .route("/featured", get(featured))
        .route("/new-arrivals", get(new_arrivals))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products in display order", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/type",
    params(
        ("type" = String, Query, description = "Category, e.g. `Body Chains`")
    ),
    responses(
        (status = 200, description = "Products of one category", body = ApiResponse<ProductList>),
        (status = 400, description = "Unknown category")
    ),
    tag = "Products"
)]
pub async fn list_by_type(
    State(state): State<AppState>,
    Query(query): Query<ProductTypeQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_by_type(&state, query.product_type).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Best-selling products without variants", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::featured(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/new-arrivals",
    responses(
        (status = 200, description = "Products flagged as new", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn new_arrivals(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::new_arrivals(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "One product", body = ApiResponse<ProductView>),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}
