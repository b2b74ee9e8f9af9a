use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromoRequest {
    pub promo_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromoDiscount {
    pub code: String,
    pub discount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePublicPromoRequest {
    /// Generated when absent.
    pub code: Option<String>,
    pub discount_percent: i32,
    pub expiry_date: DateTime<Utc>,
}
