use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{catalog::ProductType, entity::orders::OrderStatus, models::Product, routes::params::Pagination};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewVariant {
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_new: bool,
    /// The first URL becomes the primary image.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkAddProductsRequest {
    pub products: Vec<NewProduct>,
}

/// Admin operations address products by name and category.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductKey {
    pub name: String,
    pub product_type: ProductType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: String,
    pub product_type: ProductType,
    pub stock_quantity: Option<i32>,
    pub price: Option<Decimal>,
    pub is_new: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteProductsRequest {
    pub products: Vec<ProductKey>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedCount {
    pub deleted: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SortOrderEntry {
    pub name: String,
    pub product_type: ProductType,
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSortOrderRequest {
    pub entries: Vec<SortOrderEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatedCount {
    pub updated: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

impl LowStockQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct MonthlyOrderTotal {
    /// `YYYY-MM`
    pub month: String,
    pub order_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyOrderTotals {
    pub items: Vec<MonthlyOrderTotal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BirthdayPromoRun {
    pub issued: usize,
}

/// A customer account with the number of orders it has placed.
#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct UserWithOrderCount {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub order_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub total_users: i64,
    pub items: Vec<UserWithOrderCount>,
}
