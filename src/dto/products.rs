use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::ProductType,
    models::{ProductImage, ProductVariant},
};

/// Storefront shape of a product. `price` is omitted when variants carry
/// their own prices.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub sort_order: i32,
    pub is_new: bool,
    pub images: Vec<ProductImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProductVariant>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductView>)]
    pub items: Vec<ProductView>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductTypeQuery {
    #[serde(rename = "type")]
    pub product_type: ProductType,
}
