use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::CartItem;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemRequest {
    pub cart_item_id: Uuid,
}

/// A cart with every line resolved to what the storefront displays.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart_id: Uuid,
    pub total_price: Decimal,
    pub items: Vec<CartLineView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineView {
    pub cart_item_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub product_type: String,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub line_total: Decimal,
}

/// Result of an increment, decrement or delete. `item` is absent once the
/// line has been removed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemChange {
    pub item: Option<CartItem>,
    pub removed: bool,
    pub cart_total: Decimal,
}
