use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::promo::{PromoDiscount, ValidatePromoRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::promo_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_promo))
}

#[utoipa::path(
    post,
    path = "/api/promo/validate",
    request_body = ValidatePromoRequest,
    responses(
        (status = 200, description = "Discount the code would apply", body = ApiResponse<PromoDiscount>),
        (status = 400, description = "Promo code is required"),
        (status = 404, description = "Promo code is invalid or expired"),
    ),
    security(("bearer_auth" = [])),
    tag = "Promo"
)]
pub async fn validate_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidatePromoRequest>,
) -> AppResult<Json<ApiResponse<PromoDiscount>>> {
    let resp = promo_service::validate_promo(&state, &user, payload).await?;
    Ok(Json(resp))
}
